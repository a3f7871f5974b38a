pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{OrchestraConfig, OrderBook, Scenario};
pub use core::{
    collector::{BackendRegistry, OperationCollector, RequestContext},
    executor::Executor,
    middleware::{OperationsMiddleware, ResponseOutcome},
    router::{RouteCache, RouteTable},
};
pub use domain::model::{Action, BackendLog, Change, Instance, LogState, Request, Response};
pub use domain::operation::{Operation, OperationKey};
pub use domain::ports::{BackendOperations, Related, Router, ScriptRunner, UserMessenger};
pub use utils::error::{OrchestraError, Result};
