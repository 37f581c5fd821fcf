use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct Config {
    database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    uri: String,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let config = match Self::load(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                };

                config
            })
            .await
    }

    pub fn load(use_local: bool) -> ConfigResult<Self> {
        let bytes = read_config(use_local)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database.max_connections",
                reason: String::from("must be greater than zero"),
            });
        }
        Ok(config)
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl Database {
    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }
}
