//! Child process execution with a wall-clock bound.
//!
//! Every external invocation goes through [`run_bounded`], which kills the
//! child once its time is up.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a bounded child process left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status, `None` if the process had to be killed.
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Exited on its own with status zero.
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }
}

/// Run `cmd` to completion or until `timeout` elapses.
///
/// Stdout and stderr are drained on background threads so a chatty child
/// cannot stall on a full pipe. On unix the child leads its own process
/// group, and the whole group is killed once the child is done, so
/// descendants holding the pipes cannot outlive the run. Failing to start
/// the program is an [`Error::Toolchain`]; a non-zero exit or a timeout is
/// not an error.
pub fn run_bounded(mut cmd: Command, timeout: Duration) -> Result<ProcessOutput> {
    let program = cmd.get_program().to_string_lossy().to_string();

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Toolchain(format!("failed to start {program}: {e}")))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout);
    // Descendants may still hold the pipes after the leader is gone
    kill_group(&child);
    let status = status.map_err(|e| Error::Toolchain(format!("failed to wait for {program}: {e}")))?;

    let timed_out = status.is_none();
    if timed_out {
        tracing::warn!("{} exceeded {:?}, killed", program, timeout);
    }

    Ok(ProcessOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
        timed_out,
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    if let Err(e) = child.kill() {
        // Already exited between the last poll and the kill
        if e.kind() != std::io::ErrorKind::InvalidInput {
            tracing::warn!("Failed to kill child {}: {}", child.id(), e);
        }
    }
    // Reap to avoid a zombie
    child.wait()?;
    Ok(None)
}

/// SIGKILL every process left in the child's process group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid only signals that process group
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let e = std::io::Error::last_os_error();
        // ESRCH: the group is already gone
        if e.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!("Failed to kill process group {}: {}", pgid, e);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                tracing::debug!("Pipe read ended early: {}", e);
            }
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn test_captures_both_streams() {
        let out = run_bounded(sh("echo out; echo err >&2"), Duration::from_secs(10)).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let out = run_bounded(sh("echo boom >&2; exit 3"), Duration::from_secs(10)).unwrap();
        assert!(!out.success());
        assert!(!out.timed_out);
        assert_eq!(out.status.and_then(|s| s.code()), Some(3));
        assert_eq!(out.stderr.trim(), "boom");
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let out = run_bounded(sh("exec sleep 30"), Duration::from_millis(200)).unwrap();
        assert!(out.timed_out);
        assert!(out.status.is_none());
        assert!(!out.success());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_kills_descendants_holding_pipes() {
        let start = Instant::now();
        let out = run_bounded(sh("sleep 4; true"), Duration::from_millis(200)).unwrap();
        assert!(out.timed_out);
        assert!(
            start.elapsed() < Duration::from_secs(3),
            "returned after {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_background_descendant_does_not_hold_run_open() {
        let start = Instant::now();
        let out = run_bounded(sh("sleep 4 & echo started"), Duration::from_secs(10)).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "started");
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_missing_program() {
        let cmd = Command::new("/definitely/not/a/program");
        assert!(matches!(run_bounded(cmd, Duration::from_secs(1)), Err(Error::Toolchain(_))));
    }
}
