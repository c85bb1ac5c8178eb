//! Opening a workspace in an external editor.
//!
//! Launching is fire-and-forget: the editor process is spawned with null
//! stdio and never awaited by the caller. A background thread reaps it so
//! long-running hosts (the HTTP server) do not accumulate zombies.

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::error::IngestError;

/// Opens a directory in some external tool.
pub trait Launcher: Send + Sync {
    fn launch(&self, path: &Path) -> Result<(), IngestError>;
}

/// Runs `<command> <args...> <path>`, or the platform opener when no
/// command is configured.
pub struct EditorLauncher {
    command: String,
    args: Vec<String>,
}

impl EditorLauncher {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            command: config.command.trim().to_string(),
            args: config.args.clone(),
        }
    }
}

impl Launcher for EditorLauncher {
    fn launch(&self, path: &Path) -> Result<(), IngestError> {
        if !path.is_dir() {
            return Err(IngestError::Launch(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        if self.command.is_empty() {
            open::that_detached(path).map_err(|e| {
                IngestError::Launch(format!("opening {}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), "opened workspace with platform handler");
            return Ok(());
        }

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| IngestError::Launch(format!("spawning '{}': {}", self.command, e)))?;

        let pid = child.id();
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        info!(command = %self.command, pid, path = %path.display(), "editor launched");
        debug!(args = ?self.args, "editor arguments");
        Ok(())
    }
}

/// Launch the configured editor on `path`. Independent of any pipeline run.
pub fn launch_editor(config: &EditorConfig, path: &Path) -> Result<(), IngestError> {
    EditorLauncher::new(config).launch(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn editor(command: &str) -> EditorConfig {
        EditorConfig {
            command: command.to_string(),
            args: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn spawns_configured_command() {
        let tmp = TempDir::new().unwrap();
        launch_editor(&editor("true"), tmp.path()).unwrap();
    }

    #[test]
    fn missing_command_is_launch_error() {
        let tmp = TempDir::new().unwrap();
        let err = launch_editor(&editor("dsakit-no-such-editor-binary"), tmp.path()).unwrap_err();
        assert!(matches!(err, IngestError::Launch(_)));
    }

    #[test]
    fn missing_directory_is_launch_error() {
        let err = launch_editor(&editor("true"), Path::new("/nonexistent/workspace")).unwrap_err();
        assert_eq!(err.code(), "launch");
    }
}
