/// Tabvault command line support: configuration, catalog file, errors
pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::JsonCatalog;
pub use config::AppConfig;
pub use error::{CliError, Result};
