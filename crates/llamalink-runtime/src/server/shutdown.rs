//! Terminating the server child: SIGTERM with a grace period, then SIGKILL.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;
#[cfg(unix)]
use tracing::debug;

/// How long a terminated server gets to exit before it is killed.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Stop a child gracefully and reap it.
///
/// On Unix the process receives SIGTERM and has `grace` to exit before
/// SIGKILL. Elsewhere it is killed immediately.
pub async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        kill(child).await
    }
}

/// Kill a child immediately and reap it.
pub async fn kill(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }
    child.kill().await?;
    child.wait().await
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    debug!(pid, ?grace, "Server ignored SIGTERM, sending SIGKILL");
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn test_terminate_responds_to_sigterm() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let status = terminate(&mut child, GRACE_PERIOD).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_terminate_escalates_when_sigterm_is_ignored() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30")
            .spawn()
            .unwrap();
        // Give the shell time to install the trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let status = terminate(&mut child, Duration::from_millis(300))
            .await
            .unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_kill_handles_already_exited() {
        let mut child = Command::new("true").spawn().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = kill(&mut child).await.unwrap();
        assert!(status.success());
    }
}
