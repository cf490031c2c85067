use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod endpoint;
pub mod files;
pub mod motor;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the brick and print a snapshot whenever something changes.
    Watch(WatchArgs),
    /// Upload a local file to the brick.
    Upload(UploadArgs),
    /// Create a directory on the brick.
    Mkdir(PathArgs),
    /// Delete a file or empty directory on the brick.
    Rm(PathArgs),
    /// Stop motors.
    Stop(StopArgs),
    /// Play a tone.
    Tone(ToneArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, endpoint: EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, &endpoint, format).await,
        Command::Upload(args) => files::upload(args, &endpoint, format).await,
        Command::Mkdir(args) => files::mkdir(args, &endpoint, format).await,
        Command::Rm(args) => files::rm(args, &endpoint, format).await,
        Command::Stop(args) => motor::stop(args, &endpoint, format).await,
        Command::Tone(args) => motor::tone(args, &endpoint, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Brick address over Wi-Fi (host or host:port).
    #[arg(
        long,
        value_name = "ADDR",
        env = "BRICKLINE_TCP",
        global = true,
        conflicts_with = "serial"
    )]
    pub tcp: Option<String>,
    /// Serial device for a USB or Bluetooth link (e.g. /dev/rfcomm0, COM3).
    #[arg(long, value_name = "PATH", env = "BRICKLINE_SERIAL", global = true)]
    pub serial: Option<String>,
    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200, global = true)]
    pub baud: u32,
    /// Per-request reply timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Poll interval (e.g. 250ms, 1s).
    #[arg(long, default_value = "250ms")]
    pub interval: String,
    /// Exit after printing N snapshots.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print a snapshot after every poll, changed or not.
    #[arg(long)]
    pub always_notify: bool,
    /// Leave motors running between polls.
    #[arg(long)]
    pub no_safety_stop: bool,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload.
    pub local: PathBuf,
    /// Destination path on the brick (e.g. ../prjs/demo/demo.rbf).
    pub device_path: String,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Path on the brick.
    pub device_path: String,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Output ports to stop (e.g. BC, all).
    #[arg(long, default_value = "all")]
    pub ports: String,
    /// Hold position instead of coasting.
    #[arg(long)]
    pub brake: bool,
}

#[derive(Args, Debug)]
pub struct ToneArgs {
    /// Volume, 0-100.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,
    /// Frequency in Hz.
    #[arg(long, default_value_t = 440)]
    pub frequency: u16,
    /// Tone length (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
