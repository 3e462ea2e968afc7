use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use thiserror::Error;

use capture_logging::{capture_info, capture_warn};
use sitegrab_core::{JobSpec, Severity, SpecError, WorkerEvent, WorkerRequest};
use sitegrab_engine::{delete_recursive, snapshot};

use crate::observer::Observer;

/// How to launch the worker process. Overridable for tests; the default
/// resolves the `sitegrab-worker` binary installed beside the supervisor.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    fn resolve_default() -> Result<Self, StartError> {
        let exe = std::env::current_exe()
            .map_err(|err| StartError::Spawn(format!("cannot locate worker binary: {err}")))?;
        let program = exe.with_file_name("sitegrab-worker");
        Ok(Self {
            program,
            args: Vec::new(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Directory holding workspaces and finished archives; archives are
    /// served to the observer as `/projects/<name>.zip`.
    pub projects_root: PathBuf,
    /// Worker launch override. `None` means the sibling worker binary.
    pub worker_command: Option<WorkerCommand>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            projects_root: PathBuf::from("./projects"),
            worker_command: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("a capture job is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("failed to prepare workspace: {0}")]
    Workspace(String),
    #[error("failed to start worker: {0}")]
    Spawn(String),
}

/// Supervisor-side record of the one active job.
struct JobHandle {
    child: Child,
    cancelled: Arc<AtomicBool>,
}

/// Owns the worker process lifecycle for the active capture job.
///
/// At most one job runs at a time: `start_job` rejects a second start
/// instead of queueing. Results are push-only — every outcome reaches
/// the observer through its sink methods, never a return value.
pub struct JobSupervisor {
    config: SupervisorConfig,
    active: Arc<Mutex<Option<JobHandle>>>,
}

impl JobSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Starts a capture job: clears the workspace, spawns the worker,
    /// hands it the job spec, and returns once the relay is up. The run
    /// itself proceeds asynchronously; progress flows to the observer.
    pub fn start_job(
        &self,
        spec: JobSpec,
        observer: Arc<dyn Observer>,
    ) -> Result<(), StartError> {
        spec.validate()?;

        let mut slot = self
            .active
            .lock()
            .map_err(|_| StartError::Spawn("supervisor state poisoned".to_string()))?;
        // Reject before any workspace mutation or spawn.
        if slot.is_some() {
            return Err(StartError::AlreadyRunning);
        }

        let workspace = self.config.projects_root.join(&spec.directory_name);
        if workspace.exists() {
            observer.on_log(
                Severity::Warn,
                &format!(
                    "directory \"{}\" already exists, deleting",
                    spec.directory_name
                ),
            );
            delete_recursive(&workspace);
        }
        // Delete-then-create, always before the worker spawns.
        if let Err(err) = fs::create_dir_all(&workspace) {
            observer.on_log(
                Severity::Error,
                &format!("failed to prepare workspace: {err}"),
            );
            return Err(StartError::Workspace(err.to_string()));
        }

        let archive_path = self
            .config
            .projects_root
            .join(format!("{}.zip", spec.directory_name));
        let request = WorkerRequest {
            spec,
            workspace: workspace.clone(),
            archive_path,
        };

        let command = match &self.config.worker_command {
            Some(command) => command.clone(),
            None => WorkerCommand::resolve_default()?,
        };
        let mut child = match Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                observer.on_log(
                    Severity::Error,
                    &format!("failed to start capture worker: {err}"),
                );
                return Err(StartError::Spawn(err.to_string()));
            }
        };

        // One request line, then the channel is write-closed.
        if let Some(mut stdin) = child.stdin.take() {
            let line = serde_json::to_string(&request)
                .map_err(|err| StartError::Spawn(err.to_string()))?;
            if let Err(err) = writeln!(stdin, "{line}").and_then(|()| stdin.flush()) {
                let _ = child.kill();
                let _ = child.wait();
                observer.on_log(
                    Severity::Error,
                    &format!("failed to hand job to worker: {err}"),
                );
                return Err(StartError::Spawn(err.to_string()));
            }
        }

        let stdout = child.stdout.take();
        let cancelled = Arc::new(AtomicBool::new(false));
        *slot = Some(JobHandle {
            child,
            cancelled: cancelled.clone(),
        });
        drop(slot);

        capture_info!(
            "capture job started in {}",
            workspace.display()
        );

        let active = self.active.clone();
        let directory_name = request.spec.directory_name.clone();
        thread::spawn(move || {
            if let Some(stdout) = stdout {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(_) => break,
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WorkerEvent>(&line) {
                        Ok(event) => {
                            relay_event(event, &workspace, &directory_name, observer.as_ref())
                        }
                        Err(err) => {
                            capture_warn!("unparsable worker frame: {err}: {line}");
                        }
                    }
                }
            }

            // EOF: the worker exited, crashed, or was killed. All paths
            // converge on clearing the single job slot.
            if let Ok(mut slot) = active.lock() {
                if let Some(mut handle) = slot.take() {
                    let _ = handle.child.wait();
                    if !handle.cancelled.load(Ordering::SeqCst) {
                        observer.on_log(Severity::Info, "capture job finished");
                    }
                }
            }
        });

        Ok(())
    }

    /// Forcibly terminates the active job, if any. Abrupt by design: the
    /// worker's partial workspace is disposable and the next start with
    /// the same name clears it.
    pub fn cancel_job(&self, observer: &dyn Observer) {
        let Ok(mut slot) = self.active.lock() else {
            return;
        };
        let Some(handle) = slot.as_mut() else {
            // No active job: cancellation is a silent no-op.
            return;
        };
        handle.cancelled.store(true, Ordering::SeqCst);
        if let Err(err) = handle.child.kill() {
            capture_warn!("failed to kill worker: {err}");
        }
        observer.on_cancelled("capture cancellation initiated by user");
        capture_info!("capture job cancelled");
    }
}

/// Forwards one worker frame to the observer. `TreeDirectory` frames are
/// augmented with a freshly computed workspace snapshot: the worker
/// renders the tree, but the aggregate counts are recomputed here,
/// independent of anything the worker reported.
fn relay_event(
    event: WorkerEvent,
    workspace: &std::path::Path,
    directory_name: &str,
    observer: &dyn Observer,
) {
    match event {
        WorkerEvent::Log { severity, message } => observer.on_log(severity, &message),
        WorkerEvent::TreeDirectory { tree } => {
            let snap = snapshot(workspace);
            observer.on_log(Severity::Done, "the website has been captured successfully");
            observer.on_log(Severity::Info, &format!("directory tree: {directory_name}"));
            observer.on_log(Severity::Info, &tree);
            observer.on_log(
                Severity::Info,
                &format!(
                    "directories: {}, files: {}, total size: {}",
                    snap.dir_count,
                    snap.file_count,
                    snap.total_size_formatted()
                ),
            );
        }
        WorkerEvent::DownloadReady { download_link, .. } => {
            observer.on_download_ready(&download_link);
        }
    }
}
