use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-file upload ceiling used by the reference deployment (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;
/// Maximum number of files accepted in one request
pub const DEFAULT_MAX_FILES: usize = 50;
/// Default ConvertAPI endpoint
pub const DEFAULT_CONVERTAPI_BASE: &str = "https://v2.convertapi.com";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload, per file, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Largest number of files in a single request
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_file_size() -> usize {
    DEFAULT_MAX_FILE_SIZE
}

const fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
        }
    }
}

/// Which office-conversion backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterBackend {
    /// Hosted ConvertAPI service
    #[serde(alias = "convert-api", alias = "convert_api")]
    ConvertApi,
    /// Local headless LibreOffice (`soffice`) subprocess
    #[serde(alias = "soffice")]
    LibreOffice,
    /// Office conversion switched off
    Disabled,
}

impl ConverterBackend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "convertapi" | "convert-api" | "convert_api" => Some(Self::ConvertApi),
            "libreoffice" | "soffice" => Some(Self::LibreOffice),
            "disabled" | "none" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Office-conversion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Explicit backend. When unset, ConvertAPI is used if a secret is
    /// configured and conversion is disabled otherwise.
    #[serde(default)]
    pub backend: Option<ConverterBackend>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// ConvertAPI secret
    pub api_secret: Option<String>,

    /// LibreOffice executable, either a bare command name or a path
    #[serde(default = "default_soffice_path")]
    pub soffice_path: PathBuf,

    /// Upper bound for one conversion, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_api_base() -> String {
    DEFAULT_CONVERTAPI_BASE.to_string()
}

fn default_soffice_path() -> PathBuf {
    PathBuf::from("soffice")
}

const fn default_timeout_secs() -> u64 {
    120
}

const fn default_retry_count() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

impl ConverterConfig {
    /// The backend in effect after applying the secret-based default.
    pub fn effective_backend(&self) -> ConverterBackend {
        self.backend.unwrap_or_else(|| {
            if self.api_secret.as_deref().is_some_and(|s| !s.is_empty()) {
                ConverterBackend::ConvertApi
            } else {
                ConverterBackend::Disabled
            }
        })
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            backend: None,
            api_base: default_api_base(),
            api_secret: None,
            soffice_path: default_soffice_path(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub converter: ConverterConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/doconvert/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("doconvert").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.server.max_file_size == 0 {
            return Err(crate::error::Error::ConfigInvalid {
                field: "server.max_file_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.server.max_files == 0 {
            return Err(crate::error::Error::ConfigInvalid {
                field: "server.max_files".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.converter.timeout_secs == 0 {
            return Err(crate::error::Error::ConfigInvalid {
                field: "converter.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
