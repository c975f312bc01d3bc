use tokio_util::sync::CancellationToken;

use super::PageHost;
use crate::test_utils::enable_logger;
use crate::test_utils::template_corpus;
use crate::CompileError;
use crate::Error;
use crate::PostbackData;
use crate::Settings;

const LOGIN: &str = "/pages/login.aspx";

fn host_over_corpus() -> PageHost {
    PageHost::new(Settings::default(), template_corpus())
}

#[tokio::test]
async fn test_first_request_then_validated_postback() {
    enable_logger();
    let host = host_over_corpus();

    let first = host
        .handle_request(LOGIN, None, None, |_| Ok(()), CancellationToken::new())
        .await
        .expect("first request");
    assert!(first.is_valid);
    assert!(first.html.contains(r#"name="user""#));

    // Postback: submit with a blank user name; the click handler runs
    // validation the way a legacy submit button would.
    let mut postback = PostbackData::new();
    postback.insert("user", "");
    postback.insert("age", "30");
    postback.set_event("submit", None);

    let second = host
        .handle_request(
            LOGIN,
            Some(postback),
            Some(first.view_state),
            |page| {
                page.on_click("submit", Box::new(|page, _| page.validate("").map(|_| ())));
                Ok(())
            },
            CancellationToken::new(),
        )
        .await
        .expect("postback request");
    assert!(!second.is_valid);
    assert!(second.html.contains("user is required"));
}

#[tokio::test]
async fn test_missing_page_surfaces_not_found() {
    let host = host_over_corpus();
    let err = host
        .handle_request("/pages/ghost.aspx", None, None, |_| Ok(()), CancellationToken::new())
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Compile(CompileError::NotFound { .. })));
}

#[tokio::test]
async fn test_precompile_runs_on_the_queue_consumer() {
    enable_logger();
    let host = host_over_corpus();
    let token = CancellationToken::new();
    let worker = host.spawn_worker(token).expect("worker");

    host.precompile(LOGIN);
    host.shutdown();
    worker.await.expect("worker join");

    assert_eq!(host.cache().compile_count(), 1);

    // The request after precompilation hits the cache.
    host.handle_request(LOGIN, None, None, |_| Ok(()), CancellationToken::new())
        .await
        .expect("request");
    assert_eq!(host.cache().compile_count(), 1);
}
