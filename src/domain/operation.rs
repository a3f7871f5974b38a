use crate::domain::model::{Action, Context, Instance, InstanceId, Server};
use crate::domain::ports::BackendOperations;
use crate::utils::error::Result;
use std::fmt;
use std::sync::Arc;

/// Identity of an operation: two operations with the same key are the same
/// unit of work, whatever the instance state they carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKey {
    pub backend: String,
    pub instance: InstanceId,
    pub action: Action,
}

impl OperationKey {
    pub fn new(backend: &str, instance: InstanceId, action: Action) -> Self {
        Self {
            backend: backend.to_string(),
            instance,
            action,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.backend, self.action, self.instance)
    }
}

/// A pending unit of backend work derived from a model change.
#[derive(Clone)]
pub struct Operation {
    pub backend: Arc<dyn BackendOperations>,
    pub instance: Instance,
    pub action: Action,
    pub servers: Vec<Server>,
    context: Option<Context>,
}

impl Operation {
    pub fn new(backend: Arc<dyn BackendOperations>, instance: Instance, action: Action) -> Self {
        Self {
            backend,
            instance,
            action,
            servers: Vec::new(),
            context: None,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn key(&self) -> OperationKey {
        OperationKey::new(self.backend.name(), self.instance.id(), self.action)
    }

    /// Captures the backend context now, while the instance still exists.
    pub fn preload_context(&mut self) {
        self.context = Some(self.backend.get_context(&self.instance));
    }

    pub fn has_preloaded_context(&self) -> bool {
        self.context.is_some()
    }

    /// Preloaded context if any, otherwise the current one.
    pub fn context(&self) -> Context {
        match &self.context {
            Some(context) => context.clone(),
            None => self.backend.get_context(&self.instance),
        }
    }

    pub fn render(&self) -> Result<Vec<String>> {
        self.backend.render(self.action, &self.instance, &self.context())
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("backend", &self.backend.name())
            .field("instance", &self.instance.id())
            .field("action", &self.action)
            .field("servers", &self.servers)
            .finish()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
