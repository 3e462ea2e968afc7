use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::JobSpec;

/// Display severity carried by worker log events. The observer decides
/// how to render it; the worker never embeds presentation markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
    /// Terminal success notices (capture finished, archive ready).
    Done,
}

/// One worker→supervisor protocol frame, serialized as a single JSON
/// line on the worker's stdout.
///
/// Ordering contract for a successful run: zero or more `Log` frames,
/// then exactly one `TreeDirectory`, then exactly one `DownloadReady`,
/// then process exit. A failed run ends with `Log` error frames and no
/// `DownloadReady`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerEvent {
    Log {
        severity: Severity,
        message: String,
    },
    TreeDirectory {
        tree: String,
    },
    #[serde(rename_all = "camelCase")]
    DownloadReady {
        directory_name: String,
        download_link: String,
    },
}

/// The single supervisor→worker message, written as one JSON line to the
/// worker's stdin at startup. Paths are resolved supervisor-side so both
/// processes agree on the workspace and the artifact location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub spec: JobSpec,
    pub workspace: PathBuf,
    pub archive_path: PathBuf,
}
