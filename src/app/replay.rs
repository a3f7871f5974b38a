use crate::adapters::messenger::CollectingMessenger;
use crate::config::{OrchestraConfig, Scenario};
use crate::core::collector::OperationCollector;
use crate::core::executor::Executor;
use crate::core::middleware::OperationsMiddleware;
use crate::domain::model::{BackendLog, UserMessage};
use crate::domain::operation::OperationKey;
use crate::domain::ports::ScriptRunner;
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub status: u16,
    /// Operations pending when the response was ready.
    pub queued: Vec<String>,
    pub executed: bool,
    pub logs: Vec<BackendLog>,
    pub messages: Vec<UserMessage>,
}

/// Wires a middleware from configuration around the given runner.
pub fn build_middleware(
    config: &OrchestraConfig,
    runner: Arc<dyn ScriptRunner>,
    messenger: Arc<CollectingMessenger>,
) -> Result<OperationsMiddleware> {
    let router = Arc::new(config.build_router()?);
    let collector = OperationCollector::new(config.build_registry(), router)
        .with_internal_models(config.orchestration.internal_models.clone());
    Ok(
        OperationsMiddleware::new(collector, Executor::new(runner), messenger)
            .with_admin_path_prefix(config.orchestration.admin_path_prefix.clone()),
    )
}

/// Plays every change of `scenario` inside one request and finishes it.
pub async fn replay(
    config: &OrchestraConfig,
    scenario: &Scenario,
    runner: Arc<dyn ScriptRunner>,
) -> Result<ReplayReport> {
    let messenger = Arc::new(CollectingMessenger::new());
    let middleware = build_middleware(config, runner, Arc::clone(&messenger))?;

    let mut ctx = middleware.process_request(scenario.request());
    for change in &scenario.changes {
        middleware.collect(&mut ctx, change);
    }
    let queued: Vec<String> = ctx.pending_keys().iter().map(OperationKey::to_string).collect();
    tracing::info!("📋 {} operations queued", queued.len());

    let outcome = middleware.process_response(ctx, scenario.response()).await;
    let executed = outcome.logs.is_some();
    Ok(ReplayReport {
        status: outcome.response.status,
        queued,
        executed,
        logs: outcome.logs.unwrap_or_default(),
        messages: messenger.messages(),
    })
}
