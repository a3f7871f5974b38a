#[cfg(feature = "cli")]
pub mod cli;
pub mod scenario;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use scenario::{OrderBook, Scenario};
pub use toml_config::OrchestraConfig;
