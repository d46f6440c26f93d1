//! Invocation of the external regraph tool.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Instant;

use regraph_core::{RegraphError, Result, ToolchainConfig};
use tokio::process::Command;
use tracing::debug;

/// Result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Subcommand that was run.
    pub subcommand: String,

    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,

    pub success: bool,
}

impl ToolOutput {
    /// Whether the invocation exited 0.
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// Message describing a failed invocation: stderr, or the exit code when stderr is empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("{} exited with code {}", self.subcommand, self.exit_code)
        } else {
            stderr.to_string()
        }
    }

    /// Map a non-zero exit to the error built by `make`.
    pub fn check(self, make: fn(String) -> RegraphError) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(make(self.failure_message()))
        }
    }
}

/// Runs `<program> <args..> <subcommand> <sub-args..>`.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl ToolRunner {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run one subcommand to completion, capturing its output.
    ///
    /// Spawn failures and timeouts are `Toolchain` errors; a non-zero exit is
    /// returned as a normal [`ToolOutput`] for the caller to classify.
    pub async fn run(&self, subcommand: &str, sub_args: &[OsString]) -> Result<ToolOutput> {
        let start = Instant::now();

        if self.program.is_empty() {
            return Err(RegraphError::Toolchain("toolchain program is empty".to_string()));
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(subcommand)
            .args(sub_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RegraphError::Toolchain(format!("failed to spawn {}: {}", self.program, e))
            })?;

        let waited = if self.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(self.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| {
                RegraphError::Toolchain(format!(
                    "{} {} timed out after {} seconds",
                    self.program, subcommand, self.timeout_secs
                ))
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|e| {
            RegraphError::Toolchain(format!("{} {}: {}", self.program, subcommand, e))
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let result = ToolOutput {
            subcommand: subcommand.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            success: output.status.success(),
        };

        debug!(
            subcommand = %subcommand,
            exit_code = result.exit_code,
            duration_ms = duration_ms,
            "Toolchain invocation finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout_secs: u64) -> ToolRunner {
        ToolRunner::new(&ToolchainConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "regraph-tool".to_string()],
            timeout_secs,
            ready_probe: None,
        })
    }

    #[test]
    fn test_failure_message_prefers_stderr() {
        let output = ToolOutput {
            subcommand: "reconstruct".to_string(),
            exit_code: 3,
            stdout: String::new(),
            stderr: "  profile not closed\n".to_string(),
            duration_ms: 5,
            success: false,
        };
        assert!(!output.passed());
        assert_eq!(output.failure_message(), "profile not closed");

        let silent = ToolOutput {
            stderr: String::new(),
            ..output
        };
        assert_eq!(silent.failure_message(), "reconstruct exited with code 3");
    }

    #[tokio::test]
    async fn test_run_passes_subcommand_and_args() {
        let runner = sh(r#"echo "$1:$2""#, 60);
        let output = runner
            .run("supported", &[OsString::from("Couch.json")])
            .await
            .expect("run failed");
        assert!(output.passed());
        assert_eq!(output.stdout.trim(), "supported:Couch.json");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_returned() {
        let runner = sh("echo broken >&2; exit 4", 0);
        let output = runner.run("validate", &[]).await.expect("run failed");
        assert_eq!(output.exit_code, 4);

        let err = output.check(RegraphError::Validation).unwrap_err();
        assert_eq!(err.kind(), "Validation");
        assert_eq!(err.to_string(), "Graph validation failed: broken");
    }

    #[tokio::test]
    async fn test_timeout_is_toolchain_error() {
        let runner = sh("sleep 5", 1);
        let err = runner.run("generate", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "Toolchain");
        assert!(err.to_string().contains("timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = ToolRunner::new(&ToolchainConfig {
            program: "/nonexistent/regraph-tool".to_string(),
            ..Default::default()
        });
        let err = runner.run("supported", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "Toolchain");
    }
}
