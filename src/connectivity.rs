// src/connectivity.rs
//! Reachability check against the timeclock device service.
//!
//! Tries `/zk/ping` first, then falls back to `/web/webclient/version_info`.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const PING_PATH: &str = "/zk/ping";
pub const VERSION_PATH: &str = "/web/webclient/version_info";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid probe URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeReport {
    Reachable { url: String },
    /// Ping failed but the version endpoint answered.
    ReachableVersionOnly { url: String },
    Unreachable {
        ping_url: String,
        version_url: String,
        detail: String,
    },
}

impl ProbeReport {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, ProbeReport::Unreachable { .. })
    }
}

pub struct ConnectionProbe {
    client: Client,
    base: Url,
}

impl ConnectionProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, ProbeError> {
        let base = Url::parse(&format!("http://{}:{}", host, port))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    async fn get_ok(&self, url: &Url) -> Result<(), String> {
        match self.client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(format!("{} answered {}", url, response.status())),
            Err(e) => Err(format!("{}: {}", url, e)),
        }
    }

    pub async fn check(&self) -> Result<ProbeReport, ProbeError> {
        let ping_url = self.base.join(PING_PATH)?;
        let version_url = self.base.join(VERSION_PATH)?;

        let ping_failure = match self.get_ok(&ping_url).await {
            Ok(()) => {
                info!("Timeclock service reachable at {}", ping_url);
                return Ok(ProbeReport::Reachable {
                    url: ping_url.to_string(),
                });
            }
            Err(detail) => detail,
        };
        debug!("Ping failed ({}), trying version endpoint", ping_failure);

        match self.get_ok(&version_url).await {
            Ok(()) => {
                info!("Timeclock service reachable at {}", version_url);
                Ok(ProbeReport::ReachableVersionOnly {
                    url: version_url.to_string(),
                })
            }
            Err(version_failure) => {
                warn!("Timeclock service unreachable: {}", version_failure);
                Ok(ProbeReport::Unreachable {
                    ping_url: ping_url.to_string(),
                    version_url: version_url.to_string(),
                    detail: format!("{}; {}", ping_failure, version_failure),
                })
            }
        }
    }
}
