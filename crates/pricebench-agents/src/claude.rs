use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Configuration for one Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

/// Low-level failure of a CLI invocation; callers map this into the
/// stage-specific [`crate::error::PipelineError`] variant.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to spawn claude: {0}")]
    Spawn(String),

    #[error("claude exited {status}: {stderr}")]
    NonZero { status: String, stderr: String },

    #[error("claude returned an empty response")]
    Empty,

    #[error("claude timed out after {0} seconds")]
    Timeout(u64),
}

/// Invoke the `claude` CLI with a system prompt and a user prompt, returning
/// raw stdout.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, CliError> {
    debug!(model = %config.model, "Invoking claude CLI");

    let invocation = Command::new("claude")
        .args([
            "-p",
            user_prompt,
            "--system-prompt",
            system_prompt,
            "--model",
            &config.model,
            "--output-format",
            "text",
        ])
        .output();

    let output = tokio::time::timeout(config.timeout, invocation)
        .await
        .map_err(|_| CliError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| CliError::Spawn(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        warn!(status = %output.status, stderr = %stderr, "Claude CLI failed");
        return Err(CliError::NonZero {
            status: output.status.to_string(),
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(CliError::Empty);
    }

    Ok(stdout)
}

/// Check whether the `claude` CLI is on the PATH and responsive.
pub async fn check_cli_available() -> bool {
    Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}
