mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use brickline_frame::{CommandBuilder, InputPort, OutputPort, ReplyKind};
use brickline_session::{Brick, SessionConfig, SessionError};
use brickline_transport::mock::{command_kind, command_sequence, MockTransport};
use brickline_transport::TransportError;
use common::direct_reply;
use tokio::time::sleep;

fn quiet_config() -> SessionConfig {
    SessionConfig::default().with_safety_stop(false)
}

#[tokio::test]
async fn interleaved_replies_correlate_by_sequence() {
    // Hold replies until two requests are in flight, then answer newest first.
    let held = Arc::new(Mutex::new(Vec::new()));
    let transport = MockTransport::with_responder({
        let held = Arc::clone(&held);
        move |frame| {
            let mut held = held.lock().expect("held lock");
            held.push(command_sequence(frame).expect("sequence"));
            if held.len() < 2 {
                return Vec::new();
            }
            held.drain(..)
                .rev()
                .map(|seq| direct_reply(seq, &(seq as f32 * 10.0).to_le_bytes()))
                .collect()
        }
    });
    let mut brick = Brick::with_config(transport, quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let (first, second) = tokio::join!(
        brick.read_si(InputPort::One, 0),
        brick.read_si(InputPort::Two, 0),
    );
    assert_eq!(first.expect("first"), 10.0);
    assert_eq!(second.expect("second"), 20.0);
}

#[tokio::test]
async fn no_reply_commands_return_once_written() {
    let transport = MockTransport::new();
    let mut brick = Brick::with_config(transport.clone(), quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    brick
        .stop_motor(OutputPort::B | OutputPort::C, true)
        .await
        .expect("stop");
    brick.play_tone(50, 440, 200).await.expect("tone");

    let written = transport.written();
    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|f| command_kind(f) == Some(0x80)));
}

#[tokio::test]
async fn generic_send_returns_response() {
    let transport = MockTransport::with_responder(|frame| {
        let seq = command_sequence(frame).expect("sequence");
        vec![direct_reply(seq, &[0x01, 0x00])]
    });
    let mut brick = Brick::with_config(transport, quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let mut builder = CommandBuilder::direct_reply(2).expect("builder");
    builder.get_type_mode(InputPort::A, 0, 1);
    let command = builder.build().expect("command");

    let response = brick.send(&command).await.expect("send").expect("reply");
    assert_eq!(response.kind, ReplyKind::DirectOk);
    assert_eq!(response.data(), &[0x01, 0x00]);

    // the same command value can be sent again under a new sequence id
    let again = brick.send(&command).await.expect("send").expect("reply");
    assert_eq!(again.sequence, response.sequence + 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out() {
    let config = quiet_config().with_request_timeout(Some(Duration::from_millis(200)));
    let mut brick = Brick::with_config(MockTransport::new(), config);
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let err = brick.read_si(InputPort::One, 0).await.unwrap_err();
    assert!(matches!(err, SessionError::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn direct_error_reply_is_reported() {
    let transport = MockTransport::with_responder(|frame| {
        let [lo, hi] = command_sequence(frame).expect("sequence").to_le_bytes();
        vec![vec![lo, hi, 0x04, 0, 0, 0, 0].into()]
    });
    let mut brick = Brick::with_config(transport, quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let err = brick.read_si(InputPort::Four, 0).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnexpectedReply(ReplyKind::DirectError)
    ));
}

#[tokio::test]
async fn stray_frames_are_ignored() {
    let transport = MockTransport::new();
    let handle = transport.clone();
    transport.set_responder(|frame| {
        let seq = command_sequence(frame).expect("sequence");
        vec![
            vec![0x00, 0x00, 0x02, 0xAA].into(),
            vec![0x01].into(),
            direct_reply(seq.wrapping_add(100), &[0xBB; 4]),
            direct_reply(seq, &1.5f32.to_le_bytes()),
        ]
    });
    let mut brick = Brick::with_config(transport, quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    assert_eq!(brick.read_si(InputPort::One, 0).await.expect("read"), 1.5);
    assert!(handle.inject(direct_reply(42, &[])));
    assert_eq!(brick.read_si(InputPort::One, 0).await.expect("read"), 1.5);
}

#[tokio::test]
async fn link_loss_fails_outstanding_request() {
    let transport = MockTransport::new();
    let handle = transport.clone();
    let mut brick = Brick::with_config(transport, quiet_config());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let (result, ()) = tokio::join!(brick.read_si(InputPort::One, 0), async {
        sleep(Duration::from_millis(10)).await;
        handle.close();
    });
    assert!(matches!(result, Err(SessionError::Disconnected)));
    assert!(matches!(
        brick.read_si(InputPort::One, 0).await,
        Err(SessionError::Disconnected)
    ));
}

#[tokio::test]
async fn send_requires_connection() {
    let brick = Brick::new(MockTransport::new());
    assert!(matches!(
        brick.stop_motor(OutputPort::ALL, false).await,
        Err(SessionError::NotConnected)
    ));
}

#[tokio::test]
async fn connect_twice_is_rejected() {
    let mut brick = Brick::new(MockTransport::new());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");
    assert!(matches!(
        brick.connect(Duration::ZERO).await,
        Err(SessionError::AlreadyConnected)
    ));
}

#[tokio::test]
async fn missing_brick_fails_connect() {
    let transport = MockTransport::new();
    transport.set_missing(true);
    let mut brick = Brick::new(transport);
    assert!(matches!(
        brick.connect(Duration::from_millis(100)).await,
        Err(SessionError::Transport(TransportError::DeviceNotFound { .. }))
    ));
    assert!(!brick.is_connected());
}

#[tokio::test]
async fn connect_sends_safety_stop() {
    let transport = MockTransport::new();
    let mut brick = Brick::new(transport.clone());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    let written = transport.written();
    assert_eq!(written.len(), 1);
    assert_eq!(command_kind(&written[0]), Some(0x80));
    assert_eq!(
        &written[0][7..],
        &[0xA3, 0x81, 0x00, 0x81, 0x0F, 0x81, 0x00]
    );
}
