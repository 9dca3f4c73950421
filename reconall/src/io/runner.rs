//! Tool runner abstraction.
//!
//! The [`ToolRunner`] trait decouples command composition from actually
//! spawning FreeSurfer binaries. Tests use fake runners that record requests
//! without spawning processes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::cmdline::CommandLine;
use crate::io::process::{CapturedOutput, run_bounded};

/// Parameters for one tool invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub command: CommandLine,
    /// Working directory for the tool process.
    pub workdir: PathBuf,
    /// Where the stdout/stderr log is written.
    pub log_path: PathBuf,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
    /// Extra environment, e.g. `SUBJECTS_DIR`.
    pub env: Vec<(String, String)>,
}

/// How a tool invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Succeeded,
    Failed(Option<i32>),
    TimedOut,
    /// The command was the no-op placeholder; nothing was spawned.
    NothingToDo,
}

impl ToolStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ToolStatus::Succeeded | ToolStatus::NothingToDo)
    }
}

pub trait ToolRunner {
    fn run(&self, request: &RunRequest) -> Result<ToolStatus>;
}

/// Runner that spawns the tool directly (no shell).
pub struct SubprocessRunner;

impl ToolRunner for SubprocessRunner {
    #[instrument(skip_all, fields(program = request.command.program()))]
    fn run(&self, request: &RunRequest) -> Result<ToolStatus> {
        info!(command = %request.command, workdir = %request.workdir.display(), "starting tool");
        let mut cmd = Command::new(request.command.program());
        cmd.args(request.command.args())
            .current_dir(&request.workdir)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let output = run_bounded(cmd, request.timeout, request.output_limit_bytes)
            .with_context(|| format!("run {}", request.command.program()))?;
        write_tool_log(&request.log_path, &output)?;

        if output.timed_out {
            warn!(timeout_secs = request.timeout.as_secs(), "tool timed out");
            return Ok(ToolStatus::TimedOut);
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "tool failed");
            return Ok(ToolStatus::Failed(output.status.code()));
        }
        Ok(ToolStatus::Succeeded)
    }
}

/// Run `request` unless its command is the no-op placeholder.
pub fn run_tool<R: ToolRunner + ?Sized>(runner: &R, request: &RunRequest) -> Result<ToolStatus> {
    if request.command.is_nothing_to_do() {
        info!("recon-all complete: not running");
        return Ok(ToolStatus::NothingToDo);
    }
    runner.run(request)
}

fn write_tool_log(path: &Path, output: &CapturedOutput) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let mut buf = String::new();
    buf.push_str("=== stdout ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stdout));
    buf.push_str("\n=== stderr ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stderr));
    if output.dropped_bytes > 0 {
        buf.push_str(&format!("\n[truncated {} bytes]\n", output.dropped_bytes));
    }
    if output.timed_out {
        buf.push_str("\n[timed out]\n");
    }
    fs::write(path, buf).with_context(|| format!("write tool log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRunner {
        seen: RefCell<Vec<CommandLine>>,
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, request: &RunRequest) -> Result<ToolStatus> {
            self.seen.borrow_mut().push(request.command.clone());
            Ok(ToolStatus::Succeeded)
        }
    }

    fn request(command: CommandLine, dir: &Path) -> RunRequest {
        RunRequest {
            command,
            workdir: dir.to_path_buf(),
            log_path: dir.join("logs").join("tool.log"),
            timeout: Duration::from_secs(10),
            output_limit_bytes: 1_000,
            env: Vec::new(),
        }
    }

    #[test]
    fn nothing_to_do_is_not_spawned() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::default();
        let status =
            run_tool(&runner, &request(CommandLine::nothing_to_do(), temp.path())).expect("run");
        assert_eq!(status, ToolStatus::NothingToDo);
        assert!(status.is_success());
        assert!(runner.seen.borrow().is_empty());
    }

    #[test]
    fn real_commands_reach_the_runner() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::default();
        let mut cmd = CommandLine::new("recon-all");
        cmd.arg("-all");
        run_tool(&runner, &request(cmd.clone(), temp.path())).expect("run");
        assert_eq!(*runner.seen.borrow(), vec![cmd]);
    }

    #[cfg(unix)]
    #[test]
    fn subprocess_runner_writes_log_and_reports_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cmd = CommandLine::new("sh");
        cmd.extend(["-c", "echo $SUBJECTS_DIR; exit 3"]);
        let mut req = request(cmd, temp.path());
        req.env.push(("SUBJECTS_DIR".to_string(), "/data/subjects".to_string()));

        let status = SubprocessRunner.run(&req).expect("run");
        assert_eq!(status, ToolStatus::Failed(Some(3)));
        let log = fs::read_to_string(&req.log_path).expect("log");
        assert!(log.contains("/data/subjects"));
    }
}
