/// Application configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabvault_importer::scanner::{validate_filters, DEFAULT_FILTERS};
use tabvault_importer::{ScanConfig, DEFAULT_BATCH_SIZE};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tabvault.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_scan")]
    pub scan: ScanSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Directories scanned when none are given on the command line
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    #[serde(default = "default_filters")]
    pub filters: Vec<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan: default_scan(),
            catalog: default_catalog(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. TABVAULT_SCAN__BATCH_SIZE
        settings = settings.add_source(
            config::Environment::with_prefix("TABVAULT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan.batch_size == 0 {
            return Err(CliError::Config(
                "scan.batch_size must be at least 1".to_string(),
            ));
        }

        validate_filters(&self.scan.filters).map_err(CliError::Config)?;

        Ok(())
    }

    /// Scanner settings derived from this configuration
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            batch_size: self.scan.batch_size,
            follow_links: self.scan.follow_links,
            ..ScanConfig::default()
        }
    }
}

// Default values
fn default_scan() -> ScanSettings {
    ScanSettings {
        roots: Vec::new(),
        filters: default_filters(),
        batch_size: default_batch_size(),
        follow_links: false,
    }
}

fn default_filters() -> Vec<String> {
    DEFAULT_FILTERS.iter().map(ToString::to_string).collect()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        path: default_catalog_path(),
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("./data/catalog.json")
}
