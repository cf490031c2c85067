mod common;

use std::time::Duration;

use brickline_frame::SystemStatus;
use brickline_session::{Brick, SessionError, CHUNK_SIZE};
use brickline_transport::mock::MockTransport;
use common::SimBrick;

async fn connected(sim: &SimBrick) -> Brick<MockTransport> {
    let mut brick = Brick::new(sim.transport());
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");
    brick
}

#[tokio::test]
async fn upload_is_split_into_chunks() {
    let sim = SimBrick::new();
    let brick = connected(&sim).await;

    brick
        .write_file(&[0x5A; 2000], "../prjs/demo/demo.rbf")
        .await
        .expect("upload");

    assert_eq!(CHUNK_SIZE, 960);
    assert_eq!(sim.with(|s| s.chunks.clone()), vec![960, 960, 80]);
    assert_eq!(sim.with(|s| s.announced), Some(2000));
}

#[tokio::test]
async fn final_chunk_may_report_end_of_file() {
    let sim = SimBrick::new();
    sim.with(|s| s.chunk_statuses.extend([0x00, 0x00, 0x08]));
    let brick = connected(&sim).await;

    brick
        .write_file(&[0u8; 2000], "a.rsf")
        .await
        .expect("end of file on last chunk is success");
}

#[tokio::test]
async fn rejected_chunk_aborts_transfer() {
    let sim = SimBrick::new();
    sim.with(|s| s.chunk_statuses.extend([0x00, 0x0A]));
    let brick = connected(&sim).await;

    let err = brick.write_file(&[0u8; 2000], "a.rsf").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::TransferFailed(Some(SystemStatus::UnknownError))
    ));
    assert_eq!(sim.with(|s| s.chunks.len()), 2);
}

#[tokio::test]
async fn end_of_file_before_last_chunk_fails() {
    let sim = SimBrick::new();
    sim.with(|s| s.chunk_statuses.push_back(0x08));
    let brick = connected(&sim).await;

    let err = brick.write_file(&[0u8; 1500], "a.rsf").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::TransferFailed(Some(SystemStatus::EndOfFile))
    ));
    assert_eq!(sim.with(|s| s.chunks.len()), 1);
}

#[tokio::test]
async fn refused_begin_sends_no_chunks() {
    let sim = SimBrick::new();
    sim.with(|s| s.begin_status = 0x07);
    let brick = connected(&sim).await;

    let err = brick.write_file(b"data", "exists.rsf").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::BeginDownloadFailed(Some(SystemStatus::FileExists))
    ));
    assert!(sim.with(|s| s.chunks.is_empty()));
}

#[tokio::test]
async fn empty_upload_only_opens_the_file() {
    let sim = SimBrick::new();
    let brick = connected(&sim).await;

    brick.write_file(&[], "empty.rsf").await.expect("upload");
    assert_eq!(sim.with(|s| s.announced), Some(0));
    assert!(sim.with(|s| s.chunks.is_empty()));
}

#[tokio::test]
async fn begin_reply_without_handle_is_malformed() {
    let transport = MockTransport::with_responder(|frame| {
        vec![vec![frame[2], frame[3], 0x03, 0x92, 0x00].into()]
    });
    let mut brick = Brick::new(transport);
    let _stream = brick.connect(Duration::ZERO).await.expect("connect");

    assert!(matches!(
        brick.write_file(b"x", "x.rsf").await,
        Err(SessionError::MalformedReply(_))
    ));
}

#[tokio::test]
async fn directory_and_delete_map_status() {
    let sim = SimBrick::new();
    let brick = connected(&sim).await;

    brick.create_directory("../prjs/new").await.expect("mkdir");
    brick.delete_file("../prjs/new").await.expect("rm");
    brick.close_file_handle(3).await.expect("close");

    sim.with(|s| s.op_status = 0x06);
    assert!(matches!(
        brick.create_directory("bad\\path").await,
        Err(SessionError::OperationFailed(Some(SystemStatus::IllegalPath)))
    ));
    assert!(matches!(
        brick.delete_file("bad").await,
        Err(SessionError::OperationFailed(Some(SystemStatus::IllegalPath)))
    ));
}

#[tokio::test]
async fn copy_file_uploads_local_contents() {
    let sim = SimBrick::new();
    let brick = connected(&sim).await;

    let path = std::env::temp_dir().join(format!("brickline-copy-{}.bin", std::process::id()));
    std::fs::write(&path, vec![1u8; 1000]).expect("write temp file");
    brick
        .copy_file(&path, "../prjs/copy.bin")
        .await
        .expect("copy");
    std::fs::remove_file(&path).ok();

    assert_eq!(sim.with(|s| s.chunks.clone()), vec![960, 40]);

    let missing = std::env::temp_dir().join("brickline-does-not-exist.bin");
    assert!(matches!(
        brick.copy_file(&missing, "x").await,
        Err(SessionError::Io { .. })
    ));
}
