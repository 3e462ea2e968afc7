//! Console front end: starts one capture job and streams its progress.
//!
//! While a job runs, typing `cancel` terminates it.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use capture_logging::LogDestination;
use sitegrab_app::{ConsoleObserver, JobSupervisor, SupervisorConfig};
use sitegrab_core::{FileCategory, JobSpec};

struct CliArgs {
    spec: JobSpec,
    projects_root: PathBuf,
}

const USAGE: &str = "usage: sitegrab --url <URL> --dir <NAME> [--types html,css,js,images,media] \
[--max-depth N] [--max-recursive-depth N] [--recursive] [--projects-root PATH]";

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut url = None;
    let mut dir = None;
    let mut retained_types = Vec::new();
    let mut max_depth = 0u32;
    let mut max_recursive_depth = 0u32;
    let mut recursive = false;
    let mut projects_root = PathBuf::from("./projects");

    while let Some(flag) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        };
        match flag.as_str() {
            "--url" => url = Some(value("--url")?),
            "--dir" => dir = Some(value("--dir")?),
            "--types" => {
                retained_types = value("--types")?
                    .split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(str::parse::<FileCategory>)
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "--max-depth" => {
                max_depth = value("--max-depth")?
                    .parse()
                    .map_err(|_| "--max-depth expects an integer".to_string())?;
            }
            "--max-recursive-depth" => {
                max_recursive_depth = value("--max-recursive-depth")?
                    .parse()
                    .map_err(|_| "--max-recursive-depth expects an integer".to_string())?;
            }
            "--recursive" => recursive = true,
            "--projects-root" => projects_root = PathBuf::from(value("--projects-root")?),
            other => return Err(format!("unknown flag: {other}")),
        }
    }

    let spec = JobSpec {
        url: url.ok_or("--url is required")?,
        directory_name: dir.ok_or("--dir is required")?,
        retained_types,
        max_depth,
        max_recursive_depth,
        recursive,
    };
    Ok(CliArgs {
        spec,
        projects_root,
    })
}

fn main() {
    capture_logging::initialize(LogDestination::Terminal);

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let supervisor = Arc::new(JobSupervisor::new(SupervisorConfig {
        projects_root: args.projects_root,
        worker_command: None,
    }));
    let observer = Arc::new(ConsoleObserver);

    if let Err(err) = supervisor.start_job(args.spec, observer.clone()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
    println!("capture running; type \"cancel\" to stop it");

    // Command loop: the observer can cancel the job at any time.
    {
        let supervisor = supervisor.clone();
        let observer = observer.clone();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            while let Ok(read) = stdin.read_line(&mut line) {
                if read == 0 {
                    break;
                }
                if line.trim().eq_ignore_ascii_case("cancel") {
                    supervisor.cancel_job(observer.as_ref());
                }
                line.clear();
            }
        });
    }

    while supervisor.is_running() {
        thread::sleep(Duration::from_millis(100));
    }
}
