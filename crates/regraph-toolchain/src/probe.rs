//! Host readiness probe.
//!
//! Feeds a `watch` channel that flips to `true` once the configured probe
//! command exits 0. Without a probe the host counts as ready at once.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default pause between probe attempts.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(2);

/// Run the probe command once. Spawn failures count as not ready.
pub async fn probe_once(command: &[String]) -> bool {
    let Some((program, args)) = command.split_first() else {
        return true;
    };
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!(program = %program, error = %e, "Readiness probe could not start");
            false
        }
    }
}

/// Readiness signal for the startup handshake.
///
/// With a probe, a background task retries every `interval` until the probe
/// passes, then sends `true` and stops. The task also stops when every
/// receiver is gone.
pub fn readiness_signal(probe: Option<Vec<String>>, interval: Duration) -> watch::Receiver<bool> {
    let Some(command) = probe.filter(|c| !c.is_empty()) else {
        let (_tx, rx) = watch::channel(true);
        return rx;
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if probe_once(&command).await {
                info!(attempts = attempts, "Host is ready");
                // Receivers may already be gone; nothing left to do either way.
                let _ = tx.send(true);
                return;
            }
            if tx.is_closed() {
                return;
            }
            if attempts == 1 {
                warn!(probe = %command.join(" "), "Host not ready yet, waiting");
            }
            tokio::time::sleep(interval).await;
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_probe_is_ready() {
        let rx = readiness_signal(None, DEFAULT_PROBE_INTERVAL);
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_probe_once() {
        assert!(probe_once(&cmd(&["true"])).await);
        assert!(!probe_once(&cmd(&["false"])).await);
        assert!(!probe_once(&cmd(&["/nonexistent/probe"])).await);
    }

    #[tokio::test]
    async fn test_signal_flips_when_probe_passes() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ready");
        let probe = cmd(&["test", "-f", marker.to_str().unwrap()]);

        let mut rx = readiness_signal(Some(probe), Duration::from_millis(20));
        assert!(!*rx.borrow());

        std::fs::write(&marker, "").unwrap();
        tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|ready| *ready))
            .await
            .expect("probe never passed")
            .expect("sender dropped");
    }
}
