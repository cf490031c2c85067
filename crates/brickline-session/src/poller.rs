//! Periodic full-state polling with change detection.
//!
//! Every round sends one direct command that queries all eight input ports
//! and all six buttons. The reply's global memory is laid out as:
//!
//! ```text
//! offset  0  11  22  33  44  55  66  77        88      94
//!         ├───┼───┼───┼───┼───┼───┼───┼─────────┼───────┤
//!         │ 1 │ 2 │ 3 │ 4 │ A │ B │ C │ D       │buttons│
//! ```
//!
//! Each port block is `type(1) mode(1) si(f32) raw(i32) percent(1)`; the
//! buttons follow as six bytes in the order back, left, up, right, down,
//! enter.
//!
//! Rounds never overlap: the next tick waits for the previous round to
//! finish or time out, and missed ticks are delayed rather than burst.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use brickline_frame::{
    direct, BrickButton, Command, CommandBuilder, DeviceType, InputPort, OutputPort, ReplyKind,
};
use brickline_transport::FrameSink;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::link::{EventSender, Link};
use crate::state::{ButtonSet, ChangeSnapshot, DeviceState};

/// Bytes of reply memory per port.
pub const PORT_BLOCK_SIZE: usize = 11;

/// Offset of the first button flag.
pub const BUTTON_OFFSET: usize = InputPort::ALL.len() * PORT_BLOCK_SIZE;

/// Total reply memory of one poll round.
pub const POLL_REPLY_SIZE: usize = BUTTON_OFFSET + BUTTON_ORDER.len();

/// SI readings closer than this are treated as unchanged.
pub const SI_TOLERANCE: f32 = 0.01;

const BUTTON_ORDER: [BrickButton; 6] = [
    BrickButton::Back,
    BrickButton::Left,
    BrickButton::Up,
    BrickButton::Right,
    BrickButton::Down,
    BrickButton::Enter,
];

/// Build the query for one poll round, reusing each port's last mode.
pub fn poll_command(state: &DeviceState) -> brickline_frame::Result<Command> {
    let mut builder = CommandBuilder::direct_reply(POLL_REPLY_SIZE)?;
    for port in &state.ports {
        let base = port.index * PORT_BLOCK_SIZE;
        builder
            .get_type_mode(port.port, base, base + 1)
            .ready_si(port.port, port.mode, base + 2)
            .ready_raw(port.port, port.mode, base + 6)
            .ready_percent(port.port, port.mode, base + 10);
    }
    for (i, button) in BUTTON_ORDER.into_iter().enumerate() {
        builder.button_pressed(button, BUTTON_OFFSET + i);
    }
    builder.build()
}

/// Compare a poll reply to `state` and commit it.
///
/// Returns whether anything observable changed, or `None` if the payload is
/// too short to be a poll reply (in which case `state` is untouched).
pub fn apply_poll_reply(state: &mut DeviceState, payload: &[u8]) -> Option<bool> {
    if payload.len() < POLL_REPLY_SIZE {
        return None;
    }

    let mut changed = false;
    for port in state.ports.iter_mut() {
        let block = &payload[port.index * PORT_BLOCK_SIZE..][..PORT_BLOCK_SIZE];
        let device_type = DeviceType::from_code(block[0]);
        let mode = block[1];
        let si_value = f32::from_le_bytes([block[2], block[3], block[4], block[5]]);
        let raw_value = i32::from_le_bytes([block[6], block[7], block[8], block[9]]);
        let percent_value = block[10];

        changed |= port.device_type != device_type
            || si_changed(port.si_value, si_value)
            || port.raw_value != raw_value
            || port.percent_value != percent_value;

        port.device_type = device_type;
        port.mode = mode;
        port.si_value = si_value;
        port.raw_value = raw_value;
        port.percent_value = percent_value;
    }

    let flags = &payload[BUTTON_OFFSET..POLL_REPLY_SIZE];
    let buttons = ButtonSet::from_flags([
        flags[0] == 1,
        flags[1] == 1,
        flags[2] == 1,
        flags[3] == 1,
        flags[4] == 1,
        flags[5] == 1,
    ]);
    changed |= state.buttons != buttons;
    state.buttons = buttons;

    Some(changed)
}

fn si_changed(old: f32, new: f32) -> bool {
    if old.is_nan() || new.is_nan() {
        return old.is_nan() != new.is_nan();
    }
    (old - new).abs() > SI_TOLERANCE
}

/// Fire-and-forget "stop all motors".
pub(crate) fn safety_stop() -> brickline_frame::Result<Command> {
    direct::stop_motor(OutputPort::ALL, false)
}

/// Run one poll round. `Ok(None)` means the round produced no event.
pub(crate) async fn poll_round<S: FrameSink>(
    link: &Link<S>,
    state: &Mutex<DeviceState>,
    stop: Option<&Command>,
    always_notify: bool,
) -> Result<Option<ChangeSnapshot>> {
    let command = {
        let state = state.lock().unwrap_or_else(PoisonError::into_inner);
        poll_command(&state)?
    };
    let reply = link.send(&command).await;
    if let Some(stop) = stop {
        link.send(stop).await?;
    }

    let response = match reply {
        Ok(Some(response)) => response,
        Ok(None) => return Ok(None),
        Err(SessionError::Timeout(after)) => {
            debug!(?after, "poll round timed out; skipping");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    if response.kind != ReplyKind::DirectOk {
        warn!(kind = ?response.kind, "poll round rejected by brick; skipping");
        return Ok(None);
    }
    let Some(payload) = response.payload else {
        return Ok(None);
    };

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    match apply_poll_reply(&mut state, &payload) {
        None => {
            warn!(len = payload.len(), "short poll reply; skipping");
            Ok(None)
        }
        Some(changed) => {
            trace!(changed, "poll round applied");
            Ok((changed || always_notify).then(|| ChangeSnapshot::from(&*state)))
        }
    }
}

/// Poll on every tick until cancelled or the link fails.
pub(crate) async fn poll_loop<S: FrameSink>(
    link: Arc<Link<S>>,
    state: Arc<Mutex<DeviceState>>,
    interval: Duration,
    config: SessionConfig,
    events: EventSender,
) {
    let stop = if config.safety_stop {
        match safety_stop() {
            Ok(command) => Some(command),
            Err(err) => {
                warn!(error = %err, "cannot build safety stop");
                None
            }
        }
    } else {
        None
    };

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(?interval, "polling started");

    loop {
        tokio::select! {
            _ = link.cancel_token().cancelled() => break,
            _ = ticker.tick() => {}
        }

        match poll_round(&link, &state, stop.as_ref(), config.always_notify).await {
            Ok(Some(snapshot)) => {
                tokio::select! {
                    _ = link.cancel_token().cancelled() => break,
                    sent = events.send(Ok(snapshot)) => {
                        if sent.is_err() {
                            trace!("change stream dropped; state still tracked");
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(SessionError::Transport(err)) => {
                link.fail(err);
                break;
            }
            Err(SessionError::Disconnected) => break,
            Err(err) => warn!(error = %err, "poll round failed"),
        }
    }
    debug!("polling stopped");
}
