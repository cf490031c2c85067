use brickline_frame::OutputPort;

use crate::cmd::files::{close, open};
use crate::cmd::{parse_duration, EndpointArgs, StopArgs, ToneArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_operation, OperationOutput, OutputFormat};

pub async fn stop(args: StopArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = parse_ports(&args.ports)?;

    let brick = open(endpoint).await?;
    let result = brick.stop_motor(ports, args.brake).await;
    close(brick).await?;
    result.map_err(|err| session_error("stop failed", err))?;

    print_operation(
        &OperationOutput {
            operation: "stop",
            target: args.ports.to_ascii_uppercase(),
            bytes: None,
            ok: true,
        },
        format,
    );
    Ok(SUCCESS)
}

pub async fn tone(args: ToneArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let duration_ms = u16::try_from(duration.as_millis())
        .map_err(|_| CliError::new(USAGE, "tone duration must be at most 65535ms"))?;

    let brick = open(endpoint).await?;
    let result = brick.play_tone(args.volume, args.frequency, duration_ms).await;
    close(brick).await?;
    result.map_err(|err| session_error("tone failed", err))?;

    print_operation(
        &OperationOutput {
            operation: "tone",
            target: format!("{}Hz/{}ms", args.frequency, duration_ms),
            bytes: None,
            ok: true,
        },
        format,
    );
    Ok(SUCCESS)
}

fn parse_ports(input: &str) -> CliResult<OutputPort> {
    OutputPort::parse(input)
        .ok_or_else(|| CliError::new(USAGE, format!("invalid output ports: {input} (use A-D or all)")))
}
