//! Sitegrab app: job supervision and the observer-facing console front end.
mod observer;
mod supervisor;

pub use observer::{ConsoleObserver, Observer};
pub use supervisor::{JobSupervisor, StartError, SupervisorConfig, WorkerCommand};
