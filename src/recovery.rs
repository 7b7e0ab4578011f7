//! Recovery command execution
//!
//! Provides:
//! - Sequential, best-effort execution of configured remediation commands
//! - Explicit per-command result values (no error propagates across the
//!   recovery boundary)
//! - A combined report for the recovery notification

use std::process::Command;
use tracing::{info, warn};

/// Result of a single recovery command
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The command as configured
    pub command: String,
    /// Whether the command exited zero
    pub success: bool,
    /// Combined stdout and stderr (or the spawn error)
    pub output: String,
}

impl CommandResult {
    /// One-line summary for logs and the recovery report
    pub fn summary(&self) -> String {
        let status = if self.success { "ok" } else { "fail" };
        let first_line = self.output.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            format!("{}: {}", status, self.command)
        } else {
            format!("{}: {} - {}", status, self.command, first_line)
        }
    }
}

/// Aggregated outcome of one recovery attempt
#[derive(Debug, Clone, Default)]
pub struct RecoveryOutcome {
    pub results: Vec<CommandResult>,
}

impl RecoveryOutcome {
    /// True only when every command succeeded
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// Whether any command ran at all
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Per-command report lines, in execution order
    pub fn report_lines(&self) -> Vec<String> {
        self.results.iter().map(|r| r.summary()).collect()
    }

    /// Combined textual report
    #[allow(dead_code)] // Public API for outcome inspection
    pub fn report(&self) -> String {
        self.report_lines().join("\n")
    }
}

/// Runs configured remediation commands through `sh -c`.
///
/// Execution is sequential and synchronous with no per-command timeout; a
/// hanging command blocks the remainder of the cycle.
pub struct RecoveryExecutor {
    test_mode: bool,
}

impl RecoveryExecutor {
    pub fn new(test_mode: bool) -> Self {
        Self { test_mode }
    }

    /// Run every command in order. A failing command is recorded and does
    /// not stop the commands after it.
    pub fn run_all(&self, commands: &[String]) -> RecoveryOutcome {
        let mut outcome = RecoveryOutcome::default();

        for command in commands {
            let result = self.run_one(command);
            if result.success {
                info!(command = %command, "recovery command succeeded");
            } else {
                warn!(command = %command, output = %result.output.trim(), "recovery command failed");
            }
            outcome.results.push(result);
        }

        outcome
    }

    fn run_one(&self, command: &str) -> CommandResult {
        if self.test_mode {
            info!(command = %command, "TEST MODE: would run recovery command");
            return CommandResult {
                command: command.to_string(),
                success: true,
                output: "skipped in test mode".to_string(),
            };
        }

        match Command::new("sh").args(["-c", command]).output() {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                CommandResult {
                    command: command.to_string(),
                    success: output.status.success(),
                    output: format!("{}{}", stdout, stderr),
                }
            }
            Err(e) => CommandResult {
                command: command.to_string(),
                success: false,
                output: format!("failed to spawn: {}", e),
            },
        }
    }
}
