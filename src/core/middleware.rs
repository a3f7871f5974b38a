use crate::core::collector::{OperationCollector, RequestContext};
use crate::core::executor::Executor;
use crate::core::messages::summarize_logs;
use crate::domain::model::{BackendLog, Change, Request, Response};
use crate::domain::ports::UserMessenger;
use std::sync::Arc;

/// Result of finishing a request.
#[derive(Debug)]
pub struct ResponseOutcome {
    pub response: Response,
    /// `None` when execution was skipped (server error or nothing pending).
    pub logs: Option<Vec<BackendLog>>,
}

/// Collects the backend operations implied by the changes of a request and
/// runs them once the response is ready.
pub struct OperationsMiddleware {
    collector: OperationCollector,
    executor: Executor,
    messenger: Arc<dyn UserMessenger>,
    admin_path_prefix: String,
}

impl OperationsMiddleware {
    pub fn new(
        collector: OperationCollector,
        executor: Executor,
        messenger: Arc<dyn UserMessenger>,
    ) -> Self {
        Self {
            collector,
            executor,
            messenger,
            admin_path_prefix: "/admin/".to_string(),
        }
    }

    pub fn with_admin_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.admin_path_prefix = prefix.into();
        self
    }

    pub fn collector(&self) -> &OperationCollector {
        &self.collector
    }

    pub fn process_request(&self, request: Request) -> RequestContext {
        tracing::debug!("{} {}", request.method, request.path);
        RequestContext::new(request)
    }

    pub fn collect(&self, ctx: &mut RequestContext, change: &Change) {
        self.collector.collect(ctx, change);
    }

    pub fn is_admin(&self, request: &Request) -> bool {
        request.path.starts_with(&self.admin_path_prefix)
    }

    /// Executes the pending operations unless the response is a server error.
    /// Consumes the context so a request executes at most once.
    pub async fn process_response(&self, ctx: RequestContext, response: Response) -> ResponseOutcome {
        if response.is_server_error() {
            if !ctx.pending.is_empty() {
                tracing::warn!(
                    "Discarding {} pending operations: response status {}",
                    ctx.pending.len(),
                    response.status
                );
            }
            return ResponseOutcome { response, logs: None };
        }
        if ctx.pending.is_empty() {
            return ResponseOutcome { response, logs: None };
        }

        let RequestContext { request, pending, .. } = ctx;
        let logs = self.executor.execute(pending.into_vec()).await;

        if !logs.is_empty() && self.is_admin(&request) {
            if let Some(message) = summarize_logs(&logs) {
                self.messenger.message_user(&request, message);
            }
        }
        ResponseOutcome {
            response,
            logs: Some(logs),
        }
    }
}
