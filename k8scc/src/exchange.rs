//! Client of the exchange store staging archives between the launcher and the pods.
//!
//! Every build owns the location `<root>/<build id>`. The launcher uploads the
//! source archive there, the build pod uploads the compiled output next to it
//! and the chaincode pod downloads that output. Transfers are never retried
//! here, the peer re-invokes the whole phase instead.

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::build_id::BuildId;

/// Name of the source archive under a build location.
pub const SOURCE_ARCHIVE_NAME: &str = "chaincode-source.tar";

/// Name of the compiled output archive under a build location.
pub const OUTPUT_ARCHIVE_NAME: &str = "chaincode-output.tar";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange store answered {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("request to exchange store at {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ExchangeError {
    /// HTTP status code returned by the store, if the request reached it.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ExchangeError::Status { status, .. } => Some(*status),
            ExchangeError::Transport { source, .. } => source.status(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeClient {
    client: reqwest::Client,
    root: String,
}

impl ExchangeClient {
    /// Creates a client for the store rooted at `root`.
    pub fn new(root: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            root: root.trim_end_matches('/').to_owned(),
        }
    }

    /// Location owned by `build_id`, `<root>/<build id>`.
    pub fn base_url(&self, build_id: &BuildId) -> String {
        format!("{}/{build_id}", self.root)
    }

    /// Uploads the source `archive` under `base_url`.
    pub async fn upload(&self, base_url: &str, archive: Vec<u8>) -> Result<(), ExchangeError> {
        let url = format!("{base_url}/{SOURCE_ARCHIVE_NAME}");
        let size = archive.len();
        debug!(url, size, "uploading source archive");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(archive)
            .send()
            .await
            .map_err(|source| ExchangeError::Transport {
                url: url.clone(),
                source,
            })?;

        check_status(&url, response.status())?;
        info!(url, size, "source archive uploaded");

        Ok(())
    }

    /// Downloads the output archive stored under `base_url`.
    pub async fn download(&self, base_url: &str) -> Result<Vec<u8>, ExchangeError> {
        let url = format!("{base_url}/{OUTPUT_ARCHIVE_NAME}");
        let transport_error = |source| ExchangeError::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&url, response.status())?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        debug!(url, size = bytes.len(), "output archive downloaded");

        Ok(bytes.to_vec())
    }
}

fn check_status(url: &str, status: StatusCode) -> Result<(), ExchangeError> {
    if status.is_success() {
        return Ok(());
    }

    Err(ExchangeError::Status {
        url: url.to_owned(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::build_id::resolve_build_id;

    #[test]
    fn base_url_is_keyed_by_build_id() {
        let client = ExchangeClient::new("http://fileserver:8080/");
        let build_id =
            resolve_build_id(Path::new("/tmp/fabric-cc-0123456789abcdef/src")).unwrap();

        assert_eq!(client.base_url(&build_id), "http://fileserver:8080/0123456789");
    }
}
