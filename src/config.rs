//! Configuration Module
//!
//! Layered configuration: defaults, then an optional per-environment JSON
//! file, then environment variable overrides. Dotted keys map to upper-case
//! underscored variable names (`scope3.apiKey` -> `SCOPE3_APIKEY`).

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

// == Config ==
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// TCP port for the listener
    pub port: u16,
    pub scope3: Scope3Config,
    pub cache: CacheConfig,
    /// Drain window for in-flight requests before the process stops
    pub graceful_shutdown_timeout_in_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scope3Config {
    /// Upstream hostname; HTTPS is forced when the scheme is absent
    pub host: String,
    /// Bearer token sent upstream
    pub api_key: String,
    pub timeout_in_seconds: u64,
    pub max_idle_connections: usize,
    pub idle_conn_timeout_in_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Maximum resident entries
    pub capacity: usize,
    /// TTL applied to every cache insertion
    pub emission_ttl_in_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            scope3: Scope3Config::default(),
            cache: CacheConfig::default(),
            graceful_shutdown_timeout_in_seconds: 10,
        }
    }
}

impl Default for Scope3Config {
    fn default() -> Self {
        Self {
            host: "api.scope3.com".to_string(),
            api_key: String::new(),
            timeout_in_seconds: 10,
            max_idle_connections: 20,
            idle_conn_timeout_in_seconds: 60,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            emission_ttl_in_minutes: 60,
        }
    }
}

impl Config {
    // == Load ==
    /// Loads `config.<environment>.json` from the working directory when it
    /// exists, then applies environment variable overrides.
    pub fn load(environment: &str) -> Self {
        let path = format!("config.{}.json", environment);
        let mut config = Self::from_file(Path::new(&path));
        config.apply_env_overrides();
        config
    }

    /// Reads a config file, falling back to defaults when it is absent or
    /// malformed.
    pub fn from_file(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unable to parse config file; using defaults");
                Self::default()
            }
        }
    }

    // == Env Overrides ==
    fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.port, "PORT");
        override_from_env(&mut self.scope3.host, "SCOPE3_HOST");
        override_from_env(&mut self.scope3.api_key, "SCOPE3_APIKEY");
        override_from_env(&mut self.scope3.timeout_in_seconds, "SCOPE3_TIMEOUTINSECONDS");
        override_from_env(&mut self.scope3.max_idle_connections, "SCOPE3_MAXIDLECONNECTIONS");
        override_from_env(
            &mut self.scope3.idle_conn_timeout_in_seconds,
            "SCOPE3_IDLECONNTIMEOUTINSECONDS",
        );
        override_from_env(&mut self.cache.capacity, "CACHE_CAPACITY");
        override_from_env(&mut self.cache.emission_ttl_in_minutes, "CACHE_EMISSIONTTLINMINUTES");
        override_from_env(
            &mut self.graceful_shutdown_timeout_in_seconds,
            "GRACEFULSHUTDOWNTIMEOUTINSECONDS",
        );
    }

    // == Duration Accessors ==
    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_timeout_in_seconds)
    }
}

impl Scope3Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_in_seconds)
    }

    pub fn idle_conn_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_conn_timeout_in_seconds)
    }
}

impl CacheConfig {
    pub fn emission_ttl(&self) -> Duration {
        Duration::from_secs(self.emission_ttl_in_minutes * 60)
    }
}

/// Overwrites `target` when the variable is set and parses.
fn override_from_env<T: FromStr>(target: &mut T, key: &str) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}
