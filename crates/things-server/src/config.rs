//! Server configuration.
//!
//! Sources, later overriding earlier:
//! 1. built-in defaults
//! 2. the TOML file named by `THINGS_CONFIG` (default `things.toml`), if present
//! 3. `THINGS_`-prefixed environment variables, `__` separating sections
//!    (`THINGS_CACHE__BACKEND=redis`)

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use things_auth::AuthConfig;
use things_cache::CacheConfig;
use things_db::DbConfig;
use things_service::{EventsConfig, ServiceConfig};

pub const CONFIG_PATH_VAR: &str = "THINGS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "things.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub service: ServiceConfig,
    pub cache: CacheConfig,
    pub events: EventsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "things=info".into(),
        }
    }
}

impl ServerConfig {
    #[allow(clippy::result_large_err)]
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("THINGS_").split("__"))
    }
}
