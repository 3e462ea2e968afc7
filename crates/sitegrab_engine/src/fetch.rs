use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use capture_logging::{capture_debug, capture_info, capture_warn};
use sitegrab_core::{JobSpec, Severity, WorkerEvent};

use crate::savepath::{has_extension, save_path_for};
use crate::sink::EventSink;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound on in-flight requests within one crawl level.
    pub max_concurrency: usize,
    /// Pause between crawl levels, to stay polite to the origin.
    pub request_interval: Duration,
    /// Per-resource response size cap.
    pub max_bytes: u64,
    /// Depth used when the job spec leaves `max_depth` at zero.
    pub default_max_depth: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_concurrency: 5,
            request_interval: Duration::from_secs(1),
            max_bytes: 50 * 1024 * 1024,
            default_max_depth: 10,
        }
    }
}

/// Crawl parameters derived from a job spec.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub start_url: Url,
    pub max_depth: u32,
    pub recursive: bool,
    pub max_recursive_depth: u32,
}

impl CrawlPlan {
    pub fn from_spec(spec: &JobSpec, settings: &FetchSettings) -> Result<Self, FetchError> {
        let start_url =
            Url::parse(&spec.url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        // Zero means "unset"; fall back to the engine default.
        let max_depth = if spec.max_depth == 0 {
            settings.default_max_depth
        } else {
            spec.max_depth
        };
        Ok(Self {
            start_url,
            max_depth,
            recursive: spec.recursive,
            max_recursive_depth: spec.max_recursive_depth,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlSummary {
    pub saved: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid start url: {0}")]
    InvalidUrl(String),
    #[error("http client: {0}")]
    Client(String),
    #[error("start resource failed: {0}")]
    StartResource(String),
}

/// The black-box capture capability: fetch everything reachable under
/// the plan's constraints into the workspace, reporting per-resource
/// outcomes through the sink.
#[async_trait::async_trait]
pub trait SiteFetcher: Send + Sync {
    async fn capture(
        &self,
        plan: &CrawlPlan,
        workspace: &Path,
        sink: &dyn EventSink,
    ) -> Result<CrawlSummary, FetchError>;
}

/// Breadth-first, same-origin crawler over plain HTTP.
///
/// Only URLs whose string form starts with the start URL's string form
/// are followed. Asset references are bounded by `max_depth`; anchor
/// hyperlinks are additionally gated on the plan's recursion settings.
/// A single resource failure is reported and tolerated; only a failed
/// start resource fails the capture.
#[derive(Debug, Clone)]
pub struct ReqwestSiteFetcher {
    settings: FetchSettings,
}

/// How a URL was referenced by the page it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Asset,
    Anchor,
}

#[derive(Debug, Clone)]
struct Pending {
    url: Url,
    depth: u32,
    anchor_hops: u32,
}

struct Fetched {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl ReqwestSiteFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))
    }

    async fn fetch_one(&self, client: &reqwest::Client, url: &Url) -> Result<Fetched, String> {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("http status {status}"));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(format!(
                    "response too large ({content_len} > {} bytes)",
                    self.settings.max_bytes
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(format!(
                    "response too large (> {} bytes)",
                    self.settings.max_bytes
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

#[async_trait::async_trait]
impl SiteFetcher for ReqwestSiteFetcher {
    async fn capture(
        &self,
        plan: &CrawlPlan,
        workspace: &Path,
        sink: &dyn EventSink,
    ) -> Result<CrawlSummary, FetchError> {
        let client = self.build_client()?;
        let mut summary = CrawlSummary::default();
        let mut visited: HashSet<String> = HashSet::new();

        let start = Pending {
            url: plan.start_url.clone(),
            depth: 0,
            anchor_hops: 0,
        };
        visited.insert(dedupe_key(&start.url));
        let mut frontier = vec![start];

        while !frontier.is_empty() {
            let level: Vec<Pending> = std::mem::take(&mut frontier);
            capture_debug!(
                "crawl level: {} urls at depth {}",
                level.len(),
                level[0].depth
            );

            let results: Vec<(Pending, Result<Fetched, String>)> = stream::iter(level)
                .map(|pending| {
                    let client = &client;
                    async move {
                        let result = self.fetch_one(client, &pending.url).await;
                        (pending, result)
                    }
                })
                .buffer_unordered(self.settings.max_concurrency)
                .collect()
                .await;

            for (pending, result) in results {
                match result {
                    Ok(fetched) => {
                        let references =
                            collect_references(&fetched, &pending.url, plan, &mut visited);
                        match save_resource(workspace, &pending.url, &fetched) {
                            Ok(saved_path) => {
                                summary.saved += 1;
                                sink.emit(WorkerEvent::Log {
                                    severity: Severity::Info,
                                    message: format!(
                                        "resource saved: {}",
                                        saved_path.display()
                                    ),
                                });
                            }
                            Err(err) => {
                                summary.failed += 1;
                                if pending.depth == 0 {
                                    return Err(FetchError::StartResource(err.clone()));
                                }
                                sink.emit(WorkerEvent::Log {
                                    severity: Severity::Warn,
                                    message: format!(
                                        "resource error: {}: {err}",
                                        pending.url
                                    ),
                                });
                            }
                        }
                        for (url, kind) in references {
                            if let Some(next) = next_pending(&pending, url, kind, plan) {
                                frontier.push(next);
                            }
                        }
                    }
                    Err(err) => {
                        summary.failed += 1;
                        if pending.depth == 0 {
                            return Err(FetchError::StartResource(err));
                        }
                        capture_warn!("resource error: {}: {err}", pending.url);
                        sink.emit(WorkerEvent::Log {
                            severity: Severity::Warn,
                            message: format!("resource error: {}: {err}", pending.url),
                        });
                    }
                }
            }

            if !frontier.is_empty() && !self.settings.request_interval.is_zero() {
                tokio::time::sleep(self.settings.request_interval).await;
            }
        }

        capture_info!(
            "capture finished: {} saved, {} failed",
            summary.saved,
            summary.failed
        );
        Ok(summary)
    }
}

/// Extracts in-scope references from an HTML resource, claiming each in
/// the visited set. Non-HTML resources contribute nothing.
fn collect_references(
    fetched: &Fetched,
    base: &Url,
    plan: &CrawlPlan,
    visited: &mut HashSet<String>,
) -> Vec<(Url, RefKind)> {
    if !is_html(fetched.content_type.as_deref()) {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(&fetched.bytes);
    let mut found = Vec::new();
    for (url, kind) in extract_references(&text, base) {
        // Same-origin policy: plain string-prefix match on the start URL.
        if !url.as_str().starts_with(plan.start_url.as_str()) {
            continue;
        }
        if visited.insert(dedupe_key(&url)) {
            found.push((url, kind));
        }
    }
    found
}

fn next_pending(from: &Pending, url: Url, kind: RefKind, plan: &CrawlPlan) -> Option<Pending> {
    let depth = from.depth + 1;
    if depth > plan.max_depth {
        return None;
    }
    let anchor_hops = match kind {
        RefKind::Asset => from.anchor_hops,
        RefKind::Anchor => {
            if !plan.recursive || from.anchor_hops + 1 > plan.max_recursive_depth {
                return None;
            }
            from.anchor_hops + 1
        }
    };
    Some(Pending {
        url,
        depth,
        anchor_hops,
    })
}

/// Pulls asset and anchor references out of an HTML document. Fragments,
/// `javascript:` and `mailto:` references are dropped.
fn extract_references(html: &str, base: &Url) -> Vec<(Url, RefKind)> {
    let document = Html::parse_document(html);
    let mut references = Vec::new();

    let selectors = [
        ("img[src]", "src", RefKind::Asset),
        ("script[src]", "src", RefKind::Asset),
        ("link[href]", "href", RefKind::Asset),
        ("source[src]", "src", RefKind::Asset),
        ("a[href]", "href", RefKind::Anchor),
    ];
    for (selector, attr, kind) in selectors {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            if let Some(url) = resolve_reference(raw, base) {
                references.push((url, kind));
            }
        }
    }
    references
}

fn resolve_reference(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#')
        || lower.starts_with('?')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("data:")
    {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base.join(trimmed).ok()?,
    };
    url.set_fragment(None);
    Some(url)
}

fn dedupe_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

fn is_html(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return false;
    };
    let ct = ct.split(';').next().unwrap_or(ct).trim();
    ct.eq_ignore_ascii_case("text/html") || ct.eq_ignore_ascii_case("application/xhtml+xml")
}

fn save_resource(workspace: &Path, url: &Url, fetched: &Fetched) -> Result<PathBuf, String> {
    let mut relative = save_path_for(url);
    // Extensionless HTML documents get an explicit suffix so the filter
    // and the observer's tree treat them as pages.
    if is_html(fetched.content_type.as_deref()) && !has_extension(&relative) {
        let mut name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        name.push_str(".html");
        relative.set_file_name(name);
    }

    let target = workspace.join(&relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| err.to_string())?;
    }
    fs::write(&target, &fetched.bytes).map_err(|err| err.to_string())?;
    Ok(relative)
}

fn map_reqwest_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        return "timeout".to_string();
    }
    if err.is_connect() {
        return format!("connect error: {err}");
    }
    err.to_string()
}
