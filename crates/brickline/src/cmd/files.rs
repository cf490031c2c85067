use std::time::Duration;

use brickline_session::Brick;
use tracing::info;

use crate::cmd::endpoint::EndpointTransport;
use crate::cmd::{EndpointArgs, PathArgs, UploadArgs};
use crate::exit::{io_error, session_error, CliResult, SUCCESS};
use crate::output::{print_operation, OperationOutput, OutputFormat};

/// Connect without polling; one-shot commands only need request/reply.
pub(crate) async fn open(endpoint: &EndpointArgs) -> CliResult<Brick<EndpointTransport>> {
    let mut brick = endpoint.brick()?;
    brick
        .connect(Duration::ZERO)
        .await
        .map_err(|err| session_error("connect failed", err))?;
    Ok(brick)
}

pub(crate) async fn close(mut brick: Brick<EndpointTransport>) -> CliResult<()> {
    brick
        .disconnect()
        .await
        .map_err(|err| session_error("disconnect failed", err))
}

pub async fn upload(args: UploadArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let data = tokio::fs::read(&args.local)
        .await
        .map_err(|err| io_error(&format!("read {}", args.local.display()), err))?;

    let brick = open(endpoint).await?;
    let result = brick.write_file(&data, &args.device_path).await;
    close(brick).await?;
    result.map_err(|err| session_error("upload failed", err))?;

    info!(bytes = data.len(), path = %args.device_path, "upload complete");
    print_operation(
        &OperationOutput {
            operation: "upload",
            target: args.device_path,
            bytes: Some(data.len()),
            ok: true,
        },
        format,
    );
    Ok(SUCCESS)
}

pub async fn mkdir(args: PathArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let brick = open(endpoint).await?;
    let result = brick.create_directory(&args.device_path).await;
    close(brick).await?;
    result.map_err(|err| session_error("mkdir failed", err))?;

    print_operation(
        &OperationOutput {
            operation: "mkdir",
            target: args.device_path,
            bytes: None,
            ok: true,
        },
        format,
    );
    Ok(SUCCESS)
}

pub async fn rm(args: PathArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let brick = open(endpoint).await?;
    let result = brick.delete_file(&args.device_path).await;
    close(brick).await?;
    result.map_err(|err| session_error("delete failed", err))?;

    print_operation(
        &OperationOutput {
            operation: "rm",
            target: args.device_path,
            bytes: None,
            ok: true,
        },
        format,
    );
    Ok(SUCCESS)
}
