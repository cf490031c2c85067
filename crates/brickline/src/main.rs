mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, EndpointArgs};
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "brickline", version, about = "Talk to a LEGO EV3 brick")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    endpoint: EndpointArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
        .and_then(|runtime| runtime.block_on(cmd::run(cli.command, cli.endpoint, format)));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_subcommand() {
        let cli = Cli::try_parse_from([
            "brickline",
            "watch",
            "--tcp",
            "10.0.1.1",
            "--interval",
            "100ms",
            "--count",
            "3",
        ])
        .expect("watch args should parse");

        assert_eq!(cli.endpoint.tcp.as_deref(), Some("10.0.1.1"));
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.interval, "100ms");
                assert_eq!(args.count, Some(3));
                assert!(!args.always_notify);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_endpoints() {
        let err = Cli::try_parse_from([
            "brickline",
            "stop",
            "--tcp",
            "10.0.1.1",
            "--serial",
            "/dev/rfcomm0",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_upload_subcommand() {
        let cli = Cli::try_parse_from([
            "brickline",
            "--serial",
            "/dev/rfcomm0",
            "upload",
            "demo.rbf",
            "../prjs/demo/demo.rbf",
        ])
        .expect("upload args should parse");
        assert!(matches!(cli.command, Command::Upload(_)));
        assert_eq!(cli.endpoint.serial.as_deref(), Some("/dev/rfcomm0"));
    }

    #[test]
    fn tone_volume_is_bounded() {
        let err = Cli::try_parse_from(["brickline", "tone", "--volume", "150"])
            .expect_err("volume above 100 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
