//! System commands: file and directory operations on the brick.

use crate::command::{Command, CommandBuilder};
use crate::error::Result;
use crate::opcode::SystemOpcode;

/// Open a file for writing; the reply carries the handle for chunks.
pub fn begin_download(length: u32, path: &str) -> Result<Command> {
    let mut builder = CommandBuilder::system_reply();
    builder
        .system_opcode(SystemOpcode::BeginDownload)
        .raw_u32(length)
        .raw_path(path);
    builder.build()
}

/// Append one chunk to an open download handle.
pub fn continue_download(handle: u8, chunk: &[u8]) -> Result<Command> {
    let mut builder = CommandBuilder::system_reply();
    builder
        .system_opcode(SystemOpcode::ContinueDownload)
        .raw_u8(handle)
        .raw_bytes(chunk);
    builder.build()
}

pub fn create_directory(path: &str) -> Result<Command> {
    let mut builder = CommandBuilder::system_reply();
    builder
        .system_opcode(SystemOpcode::CreateDirectory)
        .raw_path(path);
    builder.build()
}

/// Delete a file or an empty directory.
pub fn delete_file(path: &str) -> Result<Command> {
    let mut builder = CommandBuilder::system_reply();
    builder.system_opcode(SystemOpcode::DeleteFile).raw_path(path);
    builder.build()
}

pub fn close_file_handle(handle: u8) -> Result<Command> {
    let mut builder = CommandBuilder::system_reply();
    builder
        .system_opcode(SystemOpcode::CloseFileHandle)
        .raw_u8(handle);
    builder.build()
}
