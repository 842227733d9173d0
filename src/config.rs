//! Configuration management for the enrollment server
//!
//! Values are layered: built-in defaults, then an optional `enroll.toml`
//! in the working directory, then `ENROLL_*` environment variables, then the
//! conventional unprefixed `PORT`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::auth::{HashParams, InputLimits};

/// Name of the optional config file (any format the `config` crate knows).
pub const CONFIG_FILE: &str = "enroll";

/// Prefix for environment overrides, e.g. `ENROLL_STORE_PATH`.
pub const ENV_PREFIX: &str = "ENROLL";

/// Upper bound for the Argon2 time cost.
const MAX_COST_FACTOR: u32 = 64;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener (restart required)
    pub bind_address: String,

    /// Listen port. Environment: `PORT`
    pub port: u16,

    /// Path of the append-only credential file
    pub store_path: String,

    /// Argon2 time cost (iterations)
    pub cost_factor: u32,

    /// Argon2 memory cost in KiB
    pub memory_cost_kib: u32,

    /// Argon2 lanes
    pub parallelism: u32,

    /// Hashes allowed to run at once; each holds `memory_cost_kib` of memory
    pub max_concurrent_hashes: usize,

    /// Security limits
    pub max_username_length: usize,
    pub max_password_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            store_path: "users.txt".to_string(),
            cost_factor: 10,
            memory_cost_kib: 19 * 1024,
            parallelism: 1,
            max_concurrent_hashes: 4,
            max_username_length: 64,
            max_password_length: 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `enroll.toml` (if present) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some(CONFIG_FILE), std::env::vars().collect())
    }

    /// Load configuration from an optional config file and an explicit set of variables
    pub fn load_from(
        config_file: Option<&str>,
        vars: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let mut builder = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("store_path", defaults.store_path)?
            .set_default("cost_factor", i64::from(defaults.cost_factor))?
            .set_default("memory_cost_kib", i64::from(defaults.memory_cost_kib))?
            .set_default("parallelism", i64::from(defaults.parallelism))?
            .set_default("max_concurrent_hashes", defaults.max_concurrent_hashes as i64)?
            .set_default("max_username_length", defaults.max_username_length as i64)?
            .set_default("max_password_length", defaults.max_password_length as i64)?;

        if let Some(name) = config_file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        // `PORT` is read before the prefixed variables are handed over
        let port = vars.get("PORT").cloned();

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(vars)),
        );

        if let Some(port) = port {
            builder = builder.set_override("port", port)?;
        }

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.store_path.trim().is_empty() {
            return Err(ConfigError::Message("store_path cannot be empty".into()));
        }

        if self.cost_factor == 0 || self.cost_factor > MAX_COST_FACTOR {
            return Err(ConfigError::Message(format!(
                "cost_factor must be between 1 and {MAX_COST_FACTOR}"
            )));
        }

        if self.parallelism == 0 {
            return Err(ConfigError::Message(
                "parallelism must be greater than 0".into(),
            ));
        }

        // Argon2 requires at least 8 KiB per lane
        match self.parallelism.checked_mul(8) {
            Some(min_memory) if self.memory_cost_kib >= min_memory => {}
            _ => {
                return Err(ConfigError::Message(
                    "memory_cost_kib must be at least 8 * parallelism".into(),
                ));
            }
        }

        if self.max_concurrent_hashes == 0 {
            return Err(ConfigError::Message(
                "max_concurrent_hashes must be greater than 0".into(),
            ));
        }

        if self.max_username_length == 0 || self.max_password_length == 0 {
            return Err(ConfigError::Message(
                "input length limits must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the credential file as PathBuf
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store_path)
    }

    /// Argon2 parameters for the hasher
    pub fn hash_params(&self) -> HashParams {
        HashParams {
            memory_cost_kib: self.memory_cost_kib,
            time_cost: self.cost_factor,
            parallelism: self.parallelism,
        }
    }

    /// Length limits for enrollment input
    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_username_length: self.max_username_length,
            max_password_length: self.max_password_length,
        }
    }
}
