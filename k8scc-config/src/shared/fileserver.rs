use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Config;
use crate::shared::{SentryConfig, ValidationError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Configuration of the exchange store server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileServerConfig {
    /// Directory uploads are written to and downloads are served from.
    pub shared_dir: PathBuf,
    /// Host address the server listens on.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional Sentry configuration for error tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

impl FileServerConfig {
    /// Builds the configuration from the `CHAINCODE_SHARED_DIR` and `HTTP_ADDRESS`
    /// variables older deployments set.
    ///
    /// `http_address` is `[host]:port`, a missing host listens on every interface.
    pub fn from_legacy(
        shared_dir: String,
        http_address: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (host, port) = match http_address.filter(|address| !address.is_empty()) {
            None => (default_host(), DEFAULT_PORT),
            Some(address) => {
                let (host, port) = address
                    .rsplit_once(':')
                    .ok_or_else(|| ValidationError::InvalidHttpAddress(address.to_owned()))?;
                let port = port
                    .parse()
                    .map_err(|_| ValidationError::InvalidHttpAddress(address.to_owned()))?;
                let host = if host.is_empty() {
                    default_host()
                } else {
                    host.to_owned()
                };

                (host, port)
            }
        };

        Ok(Self {
            shared_dir: PathBuf::from(shared_dir),
            host,
            port,
            sentry: None,
        })
    }
}

impl Config for FileServerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
