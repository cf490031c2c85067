use tracing::{debug, info};

use crate::cmd::{parse_duration, EndpointArgs, WatchArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_snapshot, OutputFormat};

pub async fn run(args: WatchArgs, endpoint: &EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let config = endpoint
        .session_config()?
        .with_always_notify(args.always_notify)
        .with_safety_stop(!args.no_safety_stop);
    let mut brick = brickline_session::Brick::with_config(endpoint.transport()?, config);

    let mut stream = brick
        .connect(interval)
        .await
        .map_err(|err| session_error("connect failed", err))?;
    info!(interval_ms = interval.as_millis() as u64, "watching brick");

    let mut printed = 0usize;
    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    break Err(CliError::new(
                        INTERNAL,
                        format!("signal handler setup failed: {err}"),
                    ));
                }
                debug!("interrupted");
                break Ok(SUCCESS);
            }
            item = stream.recv() => match item {
                Some(Ok(snapshot)) => {
                    print_snapshot(&snapshot, format);
                    printed = printed.saturating_add(1);
                    if args.count.is_some_and(|count| printed >= count) {
                        break Ok(SUCCESS);
                    }
                }
                Some(Err(err)) => break Err(session_error("link lost", err)),
                None => break Ok(SUCCESS),
            },
        }
    };

    brick
        .disconnect()
        .await
        .map_err(|err| session_error("disconnect failed", err))?;
    outcome
}
