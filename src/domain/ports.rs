use crate::core::router::RouteCache;
use crate::domain::model::{Action, Context, Instance, Request, Server, ServerOutput, UserMessage};
use crate::domain::operation::Operation;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Main-model instances a related instance implies work for.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    None,
    One(Instance),
    Many(Vec<Instance>),
}

/// A provisioning backend as seen by the operation collector and executor.
pub trait BackendOperations: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `instance` is the primary subject of this backend.
    fn is_main(&self, instance: &Instance) -> bool;

    fn get_related(&self, instance: &Instance) -> Related;

    /// Updates touching only these fields do not trigger the backend.
    fn ignore_fields(&self) -> &[String];

    /// Data needed to render commands for `instance`. Deletions capture it
    /// before the instance disappears.
    fn get_context(&self, instance: &Instance) -> Context {
        instance.fields.clone()
    }

    /// Commands implementing `action` for the given context.
    fn render(&self, action: Action, instance: &Instance, context: &Context) -> Result<Vec<String>>;
}

/// Decides which servers receive an operation.
pub trait Router: Send + Sync {
    fn get_servers(&self, operation: &Operation, cache: &mut RouteCache) -> Vec<Server>;
}

#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, server: &Server, backend: &str, script: &str) -> Result<ServerOutput>;
}

pub trait UserMessenger: Send + Sync {
    fn message_user(&self, request: &Request, message: UserMessage);
}
