use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::FileCategory;

/// Immutable description of a single capture job. Created by the
/// observer-facing layer, validated by the supervisor, then owned by the
/// worker for the duration of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Start URL; also the same-origin prefix filter for the crawl.
    pub url: String,
    /// Workspace directory name under the projects root. Must be a bare
    /// name: the supervisor deletes and recreates it before each run.
    pub directory_name: String,
    /// Categories to keep after capture. Empty means keep everything.
    pub retained_types: Vec<FileCategory>,
    /// Overall crawl depth limit. Zero selects the engine default.
    pub max_depth: u32,
    /// Hop limit for following anchor hyperlinks when `recursive` is set.
    pub max_recursive_depth: u32,
    /// Whether anchor hyperlinks are followed at all.
    pub recursive: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("url is required")]
    EmptyUrl,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("directory name is required")]
    EmptyDirectoryName,
    #[error("directory name must be a bare name: {0}")]
    UnsafeDirectoryName(String),
}

impl JobSpec {
    /// Checks the spec before any workspace mutation or worker spawn.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.url.trim().is_empty() {
            return Err(SpecError::EmptyUrl);
        }
        Url::parse(&self.url).map_err(|err| SpecError::InvalidUrl(err.to_string()))?;

        let name = self.directory_name.trim();
        if name.is_empty() {
            return Err(SpecError::EmptyDirectoryName);
        }
        // The workspace with this name is recursively deleted at job
        // start; reject anything that could escape the projects root.
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(SpecError::UnsafeDirectoryName(name.to_string()));
        }
        Ok(())
    }
}
