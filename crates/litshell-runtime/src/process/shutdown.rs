//! Descendant-tree termination for the backend subprocess.
//!
//! Streamlit forks its own workers, so signalling the launched PID alone
//! can leave orphans behind. The launcher puts the child in its own Unix
//! process group; shutdown signals the whole group with SIGTERM and
//! escalates to SIGKILL. On Windows, `taskkill /T /F` walks the tree.

use std::io;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::sleep;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Terminate the backend process and all of its descendants.
///
/// Best-effort: does not block indefinitely waiting for confirmation.
/// The caller's exit observer (which owns the `Child` handle) performs
/// the actual reaping.
///
/// # Strategy (Unix)
/// 1. SIGTERM to the process group
/// 2. Poll for up to 5 seconds for the group leader to disappear
/// 3. If still alive, SIGKILL the group
pub async fn terminate_tree(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        terminate_tree_unix(pid).await
    }

    #[cfg(not(unix))]
    {
        terminate_tree_windows(pid).await
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
async fn terminate_tree_unix(pid: u32) -> io::Result<()> {
    // Group leader: the launcher created the group with pgid == pid.
    let leader = Pid::from_raw(pid as i32);

    // Phase 1: SIGTERM to the group
    if let Err(e) = signal::killpg(leader, Signal::SIGTERM) {
        if e == Errno::ESRCH {
            // Already gone
            return Ok(());
        }
        return Err(io::Error::other(e));
    }

    // Poll for the leader to exit (up to 5 seconds). A null signal only
    // checks existence. A reaped-but-zombie leader still "exists", so the
    // caller should reap concurrently; in practice the monitor task does.
    for _ in 0..50 {
        sleep(Duration::from_millis(100)).await;
        match signal::kill(leader, None) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(()),
            Err(_) => {}
        }
    }

    // Phase 2: SIGKILL the group
    if let Err(e) = signal::killpg(leader, Signal::SIGKILL) {
        if e == Errno::ESRCH {
            return Ok(());
        }
        return Err(io::Error::other(e));
    }

    Ok(())
}

#[cfg(not(unix))]
async fn terminate_tree_windows(pid: u32) -> io::Result<()> {
    // /T terminates the whole tree, /F forces it.
    let status = tokio::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "taskkill exited with {:?} for pid {}",
            status.code(),
            pid
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_handles_already_gone() {
        // A PID that is very unlikely to exist
        let result = terminate_tree(999_999).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_kills_a_process_group() {
        let mut cmd = tokio::process::Command::new("sleep");
        cmd.arg("30");
        cmd.process_group(0);
        let mut child = cmd.spawn().expect("failed to spawn sleep");
        let pid = child.id().expect("no PID");

        // Reap concurrently so the existence poll sees the exit.
        let reaper = tokio::spawn(async move { child.wait().await });
        terminate_tree(pid).await.expect("terminate failed");

        let status = reaper.await.unwrap().expect("wait failed");
        assert!(!status.success());
    }
}
