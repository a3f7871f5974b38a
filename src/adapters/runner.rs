use crate::domain::model::{Server, ServerOutput};
use crate::domain::ports::ScriptRunner;
use crate::utils::error::{OrchestraError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const LOCAL_ADDRESSES: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Pipes scripts into `bash`, locally or through `ssh` for remote servers.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    ssh_user: String,
}

impl ShellRunner {
    pub fn new(ssh_user: impl Into<String>) -> Self {
        Self {
            ssh_user: ssh_user.into(),
        }
    }

    fn command(&self, server: &Server) -> Command {
        if LOCAL_ADDRESSES.contains(&server.address.as_str()) {
            let mut cmd = Command::new("bash");
            cmd.arg("-s");
            cmd
        } else {
            let mut cmd = Command::new("ssh");
            cmd.arg("-o")
                .arg("BatchMode=yes")
                .arg(format!("{}@{}", self.ssh_user, server.address))
                .arg("bash -s");
            cmd
        }
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, server: &Server, backend: &str, script: &str) -> Result<ServerOutput> {
        tracing::debug!("Running {} script on {} ({})", backend, server.name, server.address);
        let mut child = self
            .command(server)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin 與 stdout/stderr 必須同時處理，否則大輸出會卡住管線
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(b"set -e\n").await?;
                stdin.write_all(script.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if let Err(e) = fed {
            // bash may exit before reading the whole script
            tracing::debug!("stdin of {} on {} closed early: {}", backend, server.name, e);
        }
        let exit_code = output.status.code().ok_or_else(|| OrchestraError::ExecutionError {
            server: server.name.clone(),
            message: "script terminated by signal".to_string(),
        })?;
        Ok(ServerOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A script that would have been sent to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScript {
    pub server: String,
    pub backend: String,
    pub script: String,
}

/// Records scripts instead of running them and reports success.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    scripts: Mutex<Vec<RecordedScript>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<RecordedScript> {
        self.scripts.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ScriptRunner for DryRunRunner {
    async fn run(&self, server: &Server, backend: &str, script: &str) -> Result<ServerOutput> {
        tracing::info!("🔍 [dry-run] {} on {}:\n{}", backend, server.name, script);
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push(RecordedScript {
                server: server.name.clone(),
                backend: backend.to_string(),
                script: script.to_string(),
            });
        }
        Ok(ServerOutput::default())
    }
}
