pub mod billing_point;
pub mod chunks;
pub mod collector;
pub mod executor;
pub mod interval;
pub mod messages;
pub mod middleware;
pub mod pending;
pub mod router;

pub use crate::domain::model::{Action, Change, Instance, Request, Response};
pub use crate::domain::ports::{BackendOperations, Router, ScriptRunner, UserMessenger};
pub use crate::utils::error::Result;
