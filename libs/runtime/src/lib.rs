//! Process-level plumbing shared by the OData server: layered configuration
//! and `tracing` setup.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, LoggingConfig, ODataConfig, Section, ServerConfig};
