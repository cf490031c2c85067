//! File operations on the brick's storage.

use std::path::Path;

use brickline_frame::{system, Command, FrameError, Response, SystemStatus};
use brickline_transport::Transport;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};
use crate::session::Brick;

/// Largest payload of one continue-download command.
pub const CHUNK_SIZE: usize = 960;

impl<T: Transport> Brick<T> {
    /// Upload `data` to `device_path`, in chunks of at most [`CHUNK_SIZE`].
    ///
    /// The first rejected chunk aborts the transfer; nothing already written
    /// is rolled back.
    pub async fn write_file(&self, data: &[u8], device_path: &str) -> Result<()> {
        let length = u32::try_from(data.len()).map_err(|_| {
            SessionError::Frame(FrameError::FrameTooLarge {
                size: data.len(),
                max: u32::MAX as usize,
            })
        })?;

        let begin = self
            .system_exchange(&system::begin_download(length, device_path)?)
            .await?;
        if begin.status != Some(SystemStatus::Success) {
            return Err(SessionError::BeginDownloadFailed(begin.status));
        }
        let handle = *begin
            .data()
            .first()
            .ok_or(SessionError::MalformedReply("begin download reply has no handle"))?;
        debug!(path = device_path, handle, length, "upload started");

        let mut sent = 0;
        for chunk in data.chunks(CHUNK_SIZE) {
            let reply = self
                .system_exchange(&system::continue_download(handle, chunk)?)
                .await?;
            sent += chunk.len();
            match reply.status {
                Some(SystemStatus::Success) => {}
                Some(SystemStatus::EndOfFile) if sent == data.len() => {}
                status => return Err(SessionError::TransferFailed(status)),
            }
            trace!(sent, total = data.len(), "chunk accepted");
        }

        debug!(path = device_path, bytes = sent, "upload finished");
        Ok(())
    }

    /// Read a local file and upload it to `device_path`.
    pub async fn copy_file(&self, local: impl AsRef<Path>, device_path: &str) -> Result<()> {
        let local = local.as_ref();
        let data = tokio::fs::read(local).await.map_err(|source| SessionError::Io {
            path: local.to_path_buf(),
            source,
        })?;
        self.write_file(&data, device_path).await
    }

    pub async fn create_directory(&self, device_path: &str) -> Result<()> {
        self.system_operation(&system::create_directory(device_path)?)
            .await
    }

    /// Delete a file, or a directory that is already empty.
    pub async fn delete_file(&self, device_path: &str) -> Result<()> {
        self.system_operation(&system::delete_file(device_path)?)
            .await
    }

    pub async fn close_file_handle(&self, handle: u8) -> Result<()> {
        self.system_operation(&system::close_file_handle(handle)?)
            .await
    }

    async fn system_operation(&self, command: &Command) -> Result<()> {
        let reply = self.system_exchange(command).await?;
        match reply.status {
            Some(SystemStatus::Success) => Ok(()),
            status => Err(SessionError::OperationFailed(status)),
        }
    }

    async fn system_exchange(&self, command: &Command) -> Result<Response> {
        self.send(command)
            .await?
            .ok_or(SessionError::MalformedReply("system command expects a reply"))
    }
}
