use thiserror::Error;

use capture_logging::capture_info;
use sitegrab_core::{Severity, WorkerEvent, WorkerRequest};

use crate::archive::{archive_directory, ArchiveError};
use crate::fetch::{CrawlPlan, FetchError, FetchSettings, SiteFetcher};
use crate::filter::filter_files;
use crate::fsutil::render_tree;
use crate::sink::EventSink;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),
}

/// Runs one capture job end to end: capture, optional filter, tree
/// report, archive. Strictly sequential, no stage runs twice, and no
/// `DownloadReady` is ever emitted on a failed run.
pub async fn run_capture(
    request: &WorkerRequest,
    fetcher: &dyn SiteFetcher,
    settings: &FetchSettings,
    sink: &dyn EventSink,
) -> Result<(), PipelineError> {
    let plan = CrawlPlan::from_spec(&request.spec, settings)?;

    sink.emit(WorkerEvent::Log {
        severity: Severity::Info,
        message: format!("capture in progress for {}", plan.start_url),
    });
    let summary = fetcher.capture(&plan, &request.workspace, sink).await?;
    capture_info!(
        "capture stage done: {} saved, {} failed",
        summary.saved,
        summary.failed
    );

    if !request.spec.retained_types.is_empty() {
        filter_files(&request.workspace, &request.spec.retained_types);
    }

    let tree = render_tree(&request.workspace);
    sink.emit(WorkerEvent::TreeDirectory { tree });

    archive_directory(&request.workspace, &request.archive_path)?;

    sink.emit(WorkerEvent::Log {
        severity: Severity::Done,
        message: format!(
            "max depth: {}, max recursive depth: {}, recursive: {}",
            plan.max_depth, plan.max_recursive_depth, plan.recursive
        ),
    });
    sink.emit(WorkerEvent::DownloadReady {
        directory_name: request.spec.directory_name.clone(),
        download_link: format!("/projects/{}.zip", request.spec.directory_name),
    });
    Ok(())
}
