// Adapters layer: concrete implementations of the domain ports.

pub mod backend;
pub mod messenger;
pub mod runner;

pub use backend::{BackendConfig, ConfiguredBackend, RelatedConfig};
pub use messenger::{CollectingMessenger, TracingMessenger};
pub use runner::{DryRunRunner, ShellRunner};
