use std::time::Duration;

use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use crate::test_utils::enable_logger;
use crate::CompilerConfig;
use crate::FileProvider;
use crate::PhysicalFileProvider;

fn fast_poll_config() -> CompilerConfig {
    CompilerConfig {
        watch_poll_interval_ms: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_get_file_info_and_read_from_disk() {
    enable_logger();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("home.pt"), "<form id=\"f\"></form>").unwrap();

    let provider = PhysicalFileProvider::new(dir.path(), &fast_poll_config(), CancellationToken::new());

    let info = provider.get_file_info("/home.pt").await.unwrap();
    assert!(info.exists);
    assert_eq!(info.length, 20);

    let content = provider.open_read("/home.pt").await.unwrap();
    assert_eq!(content, b"<form id=\"f\"></form>");

    let missing = provider.get_file_info("/nope.pt").await.unwrap();
    assert!(!missing.exists);
}

#[tokio::test]
async fn test_watch_fires_after_content_change() {
    enable_logger();
    let dir = tempdir().unwrap();
    let file = dir.path().join("home.pt");
    std::fs::write(&file, "v1").unwrap();

    let provider = PhysicalFileProvider::new(dir.path(), &fast_poll_config(), CancellationToken::new());
    let mut token = provider.watch("/home.pt");

    // Longer content guarantees a fingerprint change even when the
    // filesystem's mtime granularity is coarse.
    std::fs::write(&file, "v2 with different length").unwrap();

    tokio::time::timeout(Duration::from_secs(5), token.changed())
        .await
        .expect("watch should fire after the source changes");
    assert!(token.has_changed());
}

#[tokio::test]
async fn test_watch_loop_stops_on_shutdown() {
    enable_logger();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("home.pt"), "v1").unwrap();

    let shutdown = CancellationToken::new();
    let provider = PhysicalFileProvider::new(dir.path(), &fast_poll_config(), shutdown.clone());
    let token = provider.watch("/home.pt");

    shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The poll loop exited without firing.
    assert!(!token.has_changed());
}
