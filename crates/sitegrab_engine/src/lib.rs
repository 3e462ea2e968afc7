//! Sitegrab engine: the worker-side capture pipeline and its IO stages.
mod archive;
mod fetch;
mod filter;
mod fsutil;
mod pipeline;
mod savepath;
mod sink;

pub use archive::{archive_directory, ArchiveError};
pub use fetch::{CrawlPlan, CrawlSummary, FetchError, FetchSettings, ReqwestSiteFetcher, SiteFetcher};
pub use filter::filter_files;
pub use fsutil::{delete_recursive, render_tree, snapshot, DirSnapshot};
pub use pipeline::{run_capture, PipelineError};
pub use savepath::save_path_for;
pub use sink::{ChannelEventSink, EventSink};
