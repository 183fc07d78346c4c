use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::ExportError;

/// Word export through pandoc.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    timeout: Duration,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc", Duration::from_secs(60))
    }
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn args(source: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--from".to_string(),
            "markdown".to_string(),
            "--to".to_string(),
            "docx".to_string(),
        ];
        if let Some(dir) = source.parent().filter(|d| !d.as_os_str().is_empty()) {
            args.push(format!("--resource-path={}", dir.display()));
        }
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(source.display().to_string());
        args
    }

    pub async fn convert(&self, source: &Path, output: &Path) -> Result<(), ExportError> {
        let tool = self.program.display().to_string();
        let run = Command::new(&self.program)
            .args(Self::args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => return Err(ExportError::Timeout(self.timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExportError::ToolNotFound(tool))
            }
            Ok(Err(source)) => {
                return Err(ExportError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Ok(Ok(result)) => result,
        };

        if !result.status.success() {
            return Err(ExportError::ToolFailed {
                tool,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
