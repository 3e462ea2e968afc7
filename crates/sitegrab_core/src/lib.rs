//! Sitegrab core: protocol and domain types shared by supervisor and worker.
mod category;
mod protocol;
mod sizefmt;
mod spec;

pub use category::{is_retained, FileCategory};
pub use protocol::{Severity, WorkerEvent, WorkerRequest};
pub use sizefmt::format_size;
pub use spec::{JobSpec, SpecError};
