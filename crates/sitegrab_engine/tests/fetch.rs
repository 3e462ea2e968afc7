use std::sync::{Arc, Mutex, Once};

use sitegrab_core::{Severity, WorkerEvent};
use sitegrab_engine::{
    CrawlPlan, EventSink, FetchError, FetchSettings, ReqwestSiteFetcher, SiteFetcher,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(capture_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<WorkerEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self::default()
    }

    fn take(&self) -> Vec<WorkerEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: WorkerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn quick_settings() -> FetchSettings {
    FetchSettings {
        request_interval: std::time::Duration::ZERO,
        ..FetchSettings::default()
    }
}

fn plan(start: &str, max_depth: u32, recursive: bool, max_recursive_depth: u32) -> CrawlPlan {
    CrawlPlan {
        start_url: Url::parse(start).unwrap(),
        max_depth,
        recursive,
        max_recursive_depth,
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

async fn mount_asset(server: &MockServer, route: &str, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

#[tokio::test]
async fn captures_page_and_assets_same_origin_only() {
    init_logging();
    let server = MockServer::start().await;
    let page = r#"<html><body>
        <img src="/pic.png">
        <link href="/style.css" rel="stylesheet">
        <a href="/page2">next</a>
        <img src="https://elsewhere.invalid/external.png">
    </body></html>"#;
    mount_page(&server, "/", page).await;
    mount_asset(&server, "/pic.png", "png-bytes", "image/png").await;
    mount_asset(&server, "/style.css", "body{}", "text/css").await;

    let workspace = TempDir::new().unwrap();
    let fetcher = ReqwestSiteFetcher::new(quick_settings());
    let sink = TestSink::new();

    let summary = fetcher
        .capture(
            &plan(&format!("{}/", server.uri()), 1, false, 0),
            workspace.path(),
            &sink,
        )
        .await
        .expect("capture ok");

    assert_eq!(summary.saved, 3);
    assert_eq!(summary.failed, 0);
    assert!(workspace.path().join("index.html").is_file());
    assert!(workspace.path().join("pic.png").is_file());
    assert!(workspace.path().join("style.css").is_file());
    // Anchor not followed without recursion; external origin never followed.
    assert!(!workspace.path().join("page2.html").exists());
    assert!(!workspace.path().join("external.png").exists());

    let saved_logs = sink
        .take()
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                WorkerEvent::Log {
                    severity: Severity::Info,
                    ..
                }
            )
        })
        .count();
    assert_eq!(saved_logs, 3);
}

#[tokio::test]
async fn recursion_follows_anchors_within_hop_limit() {
    init_logging();
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/page2">two</a>"#).await;
    mount_page(&server, "/page2", r#"<a href="/page3">three</a>"#).await;
    mount_page(&server, "/page3", "<p>deep</p>").await;

    let workspace = TempDir::new().unwrap();
    let fetcher = ReqwestSiteFetcher::new(quick_settings());
    let sink = TestSink::new();

    let summary = fetcher
        .capture(
            &plan(&format!("{}/", server.uri()), 5, true, 1),
            workspace.path(),
            &sink,
        )
        .await
        .expect("capture ok");

    // One anchor hop allowed: page2 captured, page3 not.
    assert_eq!(summary.saved, 2);
    assert!(workspace.path().join("page2.html").is_file());
    assert!(!workspace.path().join("page3.html").exists());
}

#[tokio::test]
async fn single_resource_failure_is_tolerated_and_reported() {
    init_logging();
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/missing.png"><link href="/style.css">"#,
    )
    .await;
    mount_asset(&server, "/style.css", "body{}", "text/css").await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let workspace = TempDir::new().unwrap();
    let fetcher = ReqwestSiteFetcher::new(quick_settings());
    let sink = TestSink::new();

    let summary = fetcher
        .capture(
            &plan(&format!("{}/", server.uri()), 2, false, 0),
            workspace.path(),
            &sink,
        )
        .await
        .expect("capture tolerates one bad resource");

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.failed, 1);
    assert!(workspace.path().join("style.css").is_file());

    let warned = sink.take().into_iter().any(|event| {
        matches!(
            &event,
            WorkerEvent::Log {
                severity: Severity::Warn,
                message,
            } if message.contains("missing.png")
        )
    });
    assert!(warned, "expected a warn log for the failed resource");
}

#[tokio::test]
async fn failed_start_resource_fails_the_capture() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let workspace = TempDir::new().unwrap();
    let fetcher = ReqwestSiteFetcher::new(quick_settings());
    let sink = TestSink::new();

    let err = fetcher
        .capture(
            &plan(&format!("{}/", server.uri()), 1, false, 0),
            workspace.path(),
            &sink,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::StartResource(_)));
}

#[tokio::test]
async fn duplicate_references_are_fetched_once() {
    init_logging();
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/pic.png"><img src="/pic.png"><img src="/pic.png#frag">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("png-bytes", "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = TempDir::new().unwrap();
    let fetcher = ReqwestSiteFetcher::new(quick_settings());
    let sink = TestSink::new();

    let summary = fetcher
        .capture(
            &plan(&format!("{}/", server.uri()), 1, false, 0),
            workspace.path(),
            &sink,
        )
        .await
        .expect("capture ok");
    assert_eq!(summary.saved, 2);
}
