//! Sink that shells out to an external render-and-print program

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::{PrintSink, RenderOptions};
use crate::error::SinkError;

/// Runs `<program> <options...> -- <text>` for each message.
///
/// The `--` keeps message text that starts with a dash from being parsed as
/// an option. The child is killed when the call is dropped, so an
/// engine-side timeout does not leave stray printer processes behind.
pub struct CommandPrintSink {
    program: PathBuf,
}

impl CommandPrintSink {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_command(&self, text: &str, options: &RenderOptions) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(options.to_args())
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl PrintSink for CommandPrintSink {
    async fn render_and_print(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<(), SinkError> {
        let program = self.program.display().to_string();
        debug!("Running {} {}", program, options.to_args().join(" "));

        let output = self
            .build_command(text, options)
            .output()
            .await
            .map_err(|source| SinkError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SinkError::CommandFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[{}] {}", program, line);
        }
        info!("Print command {} completed", program);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
