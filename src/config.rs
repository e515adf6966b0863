// src/config.rs
use serde::Deserialize;
use thiserror::Error;

use crate::collaborators::ResolutionPolicy;

pub const ENV_PREFIX: &str = "ATTENDANCE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    // Ping server
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    // Timeclock device endpoint probed by `check-connection`
    #[serde(default = "default_zk_host")]
    pub zk_host: String,
    #[serde(default = "default_zk_port")]
    pub zk_port: u16,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    // Import
    #[serde(default = "default_create_missing_employees")]
    pub create_missing_employees: bool,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8069
}

fn default_zk_host() -> String {
    "localhost".to_string()
}

fn default_zk_port() -> u16 {
    9095
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_create_missing_employees() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_server_port(),
            zk_host: default_zk_host(),
            zk_port: default_zk_port(),
            probe_timeout_secs: default_probe_timeout_secs(),
            create_missing_employees: default_create_missing_employees(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env::<AppConfig>()?)
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        if self.create_missing_employees {
            ResolutionPolicy::CreateMissing
        } else {
            ResolutionPolicy::DropMissing
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
