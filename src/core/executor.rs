use crate::domain::model::{BackendLog, LogState, Server};
use crate::domain::operation::Operation;
use crate::domain::ports::ScriptRunner;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinSet;

/// One script: all operations of one backend on one server.
#[derive(Debug)]
struct ScriptBatch {
    server: Server,
    backend: String,
    operations: Vec<String>,
    commands: Vec<String>,
    render_errors: Vec<String>,
}

impl ScriptBatch {
    fn script(&self) -> String {
        self.commands.join("\n")
    }
}

/// Runs pending operations grouped by `(server, backend)`.
pub struct Executor {
    runner: Arc<dyn ScriptRunner>,
}

impl Executor {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Executes every operation on its servers and returns one log per
    /// `(server, backend)` group, in the order the groups were first seen.
    pub async fn execute(&self, operations: Vec<Operation>) -> Vec<BackendLog> {
        let batches = Self::batch(&operations);
        tracing::info!(
            "🚀 Executing {} operations in {} scripts",
            operations.len(),
            batches.len()
        );

        let mut tasks = JoinSet::new();
        for (ix, batch) in batches.into_iter().enumerate() {
            let runner = Arc::clone(&self.runner);
            tasks.spawn(async move { (ix, Self::run_batch(runner, batch).await) });
        }

        let mut logs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => logs.push(entry),
                Err(e) => tracing::error!("❌ Backend task failed to complete: {}", e),
            }
        }
        logs.sort_by_key(|(ix, _)| *ix);
        logs.into_iter().map(|(_, log)| log).collect()
    }

    fn batch(operations: &[Operation]) -> Vec<ScriptBatch> {
        let mut batches: Vec<ScriptBatch> = Vec::new();
        for operation in operations {
            tracing::debug!("Preparing {}", operation);
            let rendered = operation.render();
            for server in &operation.servers {
                let ix = match batches
                    .iter()
                    .position(|b| &b.server == server && b.backend == operation.backend_name())
                {
                    Some(ix) => ix,
                    None => {
                        batches.push(ScriptBatch {
                            server: server.clone(),
                            backend: operation.backend_name().to_string(),
                            operations: Vec::new(),
                            commands: Vec::new(),
                            render_errors: Vec::new(),
                        });
                        batches.len() - 1
                    }
                };
                let batch = &mut batches[ix];
                batch.operations.push(operation.to_string());
                match &rendered {
                    Ok(commands) => batch.commands.extend(commands.iter().cloned()),
                    Err(e) => batch.render_errors.push(e.to_string()),
                }
            }
        }
        batches
    }

    async fn run_batch(runner: Arc<dyn ScriptRunner>, batch: ScriptBatch) -> BackendLog {
        let script = batch.script();
        let mut log = BackendLog {
            backend: batch.backend.clone(),
            server: batch.server.name.clone(),
            state: LogState::Error,
            script: script.clone(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            operations: batch.operations.clone(),
            created_at: Utc::now(),
        };

        if !batch.render_errors.is_empty() {
            log.stderr = batch.render_errors.join("\n");
            tracing::warn!("⚠️ {} on {}: {}", batch.backend, batch.server.name, log.stderr);
            return log;
        }

        match runner.run(&batch.server, &batch.backend, &script).await {
            Ok(output) => {
                log.state = if output.exit_code == 0 {
                    LogState::Success
                } else {
                    LogState::Failure
                };
                log.exit_code = Some(output.exit_code);
                log.stdout = output.stdout;
                log.stderr = output.stderr;
            }
            Err(e) => {
                log.stderr = e.to_string();
            }
        }

        for operation in &log.operations {
            tracing::info!("Executed {} on {} ({:?})", operation, log.server, log.state);
        }
        let stdout = log.stdout.trim();
        if !stdout.is_empty() {
            tracing::debug!("STDOUT {}", stdout);
        }
        let stderr = log.stderr.trim();
        if !stderr.is_empty() {
            tracing::debug!("STDERR {}", stderr);
        }
        log
    }
}
