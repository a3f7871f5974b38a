//! Consolidates the model changes of one request into backend operations.

use crate::core::pending::PendingOperations;
use crate::core::router::RouteCache;
use crate::domain::model::{Action, Change, ChangeKind, Instance, M2mAction, Request};
use crate::domain::operation::{Operation, OperationKey};
use crate::domain::ports::{BackendOperations, Related, Router};
use std::sync::Arc;

/// Models whose changes never trigger backends (the bookkeeping of execution itself).
pub const DEFAULT_INTERNAL_MODELS: &[&str] = &["orchestration.BackendLog", "orchestration.BackendOperation"];

/// Static list of backends known to the application.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn BackendOperations>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn BackendOperations>) {
        self.backends.push(backend);
    }

    pub fn with(mut self, backend: Arc<dyn BackendOperations>) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn BackendOperations>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn BackendOperations>> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Everything the collector keeps for one request. Dropped (or consumed by
/// the middleware) when the request ends.
#[derive(Debug)]
pub struct RequestContext {
    pub request: Request,
    pub pending: PendingOperations,
    pub route_cache: RouteCache,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            pending: PendingOperations::new(),
            route_cache: RouteCache::new(),
        }
    }

    pub fn pending_keys(&self) -> Vec<OperationKey> {
        self.pending.keys()
    }
}

pub struct OperationCollector {
    registry: BackendRegistry,
    router: Arc<dyn Router>,
    internal_models: Vec<String>,
}

impl OperationCollector {
    pub fn new(registry: BackendRegistry, router: Arc<dyn Router>) -> Self {
        Self {
            registry,
            router,
            internal_models: DEFAULT_INTERNAL_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_internal_models(mut self, models: Vec<String>) -> Self {
        self.internal_models = models;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    pub fn collect(&self, ctx: &mut RequestContext, change: &Change) {
        if self.internal_models.contains(&change.instance.model) {
            return;
        }
        let action = match &change.kind {
            ChangeKind::Saved { .. } => Action::Save,
            ChangeKind::Deleted => Action::Delete,
            // 只處理 post_add: 其他時機關聯物件尚未可用
            ChangeKind::M2mChanged { action, added } => {
                if *action != M2mAction::PostAdd || added.is_empty() {
                    return;
                }
                Action::Save
            }
        };

        for backend in self.registry.iter() {
            for (instance, action) in self.targets(backend, ctx, change, action) {
                self.queue(backend, ctx, change, instance, action);
            }
        }
    }

    /// Instances `backend` has to act on for this change.
    fn targets(
        &self,
        backend: &Arc<dyn BackendOperations>,
        ctx: &RequestContext,
        change: &Change,
        action: Action,
    ) -> Vec<(Instance, Action)> {
        if backend.is_main(&change.instance) {
            return vec![(change.instance.clone(), action)];
        }

        let candidates = match backend.get_related(&change.instance) {
            Related::None => return Vec::new(),
            Related::One(candidate) => vec![candidate],
            Related::Many(all) => match &change.kind {
                ChangeKind::M2mChanged { added, .. } => added.clone(),
                _ => all,
            },
        };

        candidates
            .into_iter()
            .filter(|candidate| {
                let delete = OperationKey::new(backend.name(), candidate.id(), Action::Delete);
                !ctx.pending.contains(&delete)
            })
            .map(|candidate| (candidate, Action::Save))
            .collect()
    }

    fn queue(
        &self,
        backend: &Arc<dyn BackendOperations>,
        ctx: &mut RequestContext,
        change: &Change,
        instance: Instance,
        action: Action,
    ) {
        match action {
            Action::Delete => {
                let save = OperationKey::new(backend.name(), instance.id(), Action::Save);
                if ctx.pending.remove(&save).is_some() {
                    tracing::debug!("Dropped pending {} superseded by delete", save);
                }
            }
            Action::Save => {
                if !change.touches_fields_outside(backend.ignore_fields()) {
                    tracing::trace!(
                        "Skipping {} for {}: only ignored fields changed",
                        backend.name(),
                        instance.id()
                    );
                    return;
                }
            }
        }

        let mut operation = Operation::new(Arc::clone(backend), instance, action);
        let servers = self.router.get_servers(&operation, &mut ctx.route_cache);
        if servers.is_empty() {
            tracing::trace!("No route for {}", operation);
            return;
        }
        operation.servers = servers;

        match action {
            Action::Save => {
                tracing::debug!("Queued {}", operation);
                ctx.pending.replace(operation);
            }
            Action::Delete => {
                operation.preload_context();
                let key = operation.key();
                if ctx.pending.insert(operation) {
                    tracing::debug!("Queued {}", key);
                }
            }
        }
    }
}
