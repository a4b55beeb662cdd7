//! Extension installation through Azure Functions Core Tools.

use std::path::Path;
use std::process::Command;

use azkit_core::{
    application::{ApplicationError, ports::ExtensionInstaller},
    error::AzkitResult,
};
use tracing::{debug, info, instrument};

const FUNC: &str = "func";

/// Runs `func extensions install --java` inside the staging directory.
#[derive(Debug, Clone)]
pub struct FuncCoreToolsInstaller {
    program: String,
}

impl Default for FuncCoreToolsInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl FuncCoreToolsInstaller {
    pub fn new() -> Self {
        Self::with_program(FUNC)
    }

    /// Use another executable in place of `func`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ExtensionInstaller for FuncCoreToolsInstaller {
    #[instrument(skip(self), fields(program = %self.program))]
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> AzkitResult<()> {
        let executable = which::which(&self.program).map_err(|_| ApplicationError::CommandNotFound {
            command: self.program.clone(),
        })?;
        debug!(executable = %executable.display(), base_dir = %base_dir.display(), "Found Core Tools");

        let output = Command::new(&executable)
            .args(["extensions", "install", "--java"])
            .current_dir(staging_dir)
            .output()
            .map_err(|e| ApplicationError::CommandFailed {
                command: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApplicationError::CommandFailed {
                command: format!("{} extensions install --java", self.program),
                reason: match stderr.trim() {
                    "" => output.status.to_string(),
                    message => message.to_string(),
                },
            }
            .into());
        }

        info!(staging = %staging_dir.display(), "Installed function extensions");
        Ok(())
    }
}
