use anyhow::{Context, Result};
use odata_core::MetadataLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::home_dir::resolve_home_dir;

/// Application configuration: server binding, logging sections and the
/// OData service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub odata: ODataConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // normalized to an absolute path on load
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub timeout_sec: u64,
}

/// OData service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ODataConfig {
    /// Path prefix all OData routes are nested under.
    pub route_prefix: String,
    /// EDM namespace used in `@odata.type` and `$metadata`.
    pub namespace: String,
    /// Metadata level applied when the negotiated media type names none.
    pub default_metadata: MetadataLevelSetting,
}

/// Serde-friendly mirror of [`MetadataLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevelSetting {
    Minimal,
    Full,
    None,
}

impl From<MetadataLevelSetting> for MetadataLevel {
    fn from(s: MetadataLevelSetting) -> Self {
        match s {
            MetadataLevelSetting::Minimal => MetadataLevel::Minimal,
            MetadataLevelSetting::Full => MetadataLevel::Full,
            MetadataLevelSetting::None => MetadataLevel::None,
        }
    }
}

impl Default for ODataConfig {
    fn default() -> Self {
        Self {
            route_prefix: "/odata".to_string(),
            namespace: "Sample".to_string(),
            default_metadata: MetadataLevelSetting::Minimal,
        }
    }
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/odata.log", empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => platform default resolved by resolve_home_dir()
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/odata-server.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            odata: ODataConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        anyhow::ensure!(
            config_path.is_file(),
            "config file not found: {}",
            config_path.display()
        );

        // Logging stays None unless YAML/ENV provide it.
        let base = AppConfig {
            server: ServerConfig::default(),
            logging: None,
            odata: ODataConfig::default(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            // APP__SERVER__PORT=8087 maps to server.port
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;
        config.odata.route_prefix = normalize_prefix(&config.odata.route_prefix);

        Ok(config)
    }

    /// Load configuration from file or create with default values.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(),
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

const fn default_subdir() -> &'static str {
    ".odata-server"
}

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let opt = if server.home_dir.trim().is_empty() {
        None
    } else {
        Some(server.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, default_subdir(), /*create*/ true)
        .context("home_dir normalization failed")?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

/// `odata/` → `/odata`; empty stays empty (routes mounted at the root).
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
