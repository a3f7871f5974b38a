pub mod billing_report;
pub mod replay;

pub use billing_report::{billing_report, BillingReport};
pub use replay::{build_middleware, replay, ReplayReport};
