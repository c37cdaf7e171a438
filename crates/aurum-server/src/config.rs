//! Server configuration.

use serde::{Deserialize, Serialize};

use aurum_traits::config::EngineConfig;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON fixture backing the primary source
    pub data_file: Option<String>,

    /// JSON fixture backing the secondary (historical fallback) source
    pub fallback_data_file: Option<String>,

    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_file: None,
            fallback_data_file: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, std::io::Error> {
        toml::from_str(content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
