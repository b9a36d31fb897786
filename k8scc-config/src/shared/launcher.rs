use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Config;
use crate::shared::{ResourcesConfig, SentryConfig, ValidationError, WatchConfig};

/// Image used by the setup, download, upload and artifact provisioning steps.
pub const DEFAULT_INIT_IMAGE: &str = "dviejo/fabric-init:amd64-2.2.0";

/// Complete configuration of the external builder and launcher.
///
/// Read once at process start and passed by reference to every procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LauncherConfig {
    /// Namespace the peer pod lives in and where build and run pods are created.
    pub namespace: String,
    /// Root URL of the exchange store, without trailing slash.
    pub file_server_url: String,
    /// Image of the helper containers (needs `bash`, `curl` and `tar`).
    #[serde(default = "default_init_image")]
    pub init_image: String,
    /// Builder image per chaincode type, for example `golang: hyperledger/fabric-ccenv:2.2`.
    #[serde(default)]
    pub images: HashMap<String, String>,
    /// Settings of the build pod.
    #[serde(default)]
    pub builder: WorkloadConfig,
    /// Settings of the chaincode pod.
    #[serde(default)]
    pub launcher: WorkloadConfig,
    /// Name of the peer pod owning every created pod.
    ///
    /// Defaults to the `HOSTNAME` environment variable, which Kubernetes sets to the pod name.
    #[serde(default)]
    pub peer_pod_name: Option<String>,
    /// Peer address handed to the chaincode instead of the one the peer supplied.
    #[serde(default)]
    pub peer_address: Option<String>,
    /// Pod lifecycle watcher settings.
    #[serde(default)]
    pub watch: WatchConfig,
    /// Optional Sentry configuration for error tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

impl LauncherConfig {
    /// Returns the builder image configured for `chaincode_type`, ignoring case.
    pub fn builder_image(&self, chaincode_type: &str) -> Option<&str> {
        let wanted = chaincode_type.to_lowercase();
        self.images
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, image)| image.as_str())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.namespace.trim().is_empty() {
            return Err(ValidationError::EmptyNamespace);
        }
        if self.file_server_url.trim().is_empty() {
            return Err(ValidationError::EmptyFileServerUrl);
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ValidationError::PollIntervalZero);
        }
        if self.watch.retry.max_attempts == 0 {
            return Err(ValidationError::RetryAttemptsZero);
        }
        if self.builder.env.iter().any(|env| env.name.is_empty()) {
            return Err(ValidationError::UnnamedEnvVar("builder"));
        }
        if self.launcher.env.iter().any(|env| env.name.is_empty()) {
            return Err(ValidationError::UnnamedEnvVar("launcher"));
        }

        Ok(())
    }
}

impl Config for LauncherConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Settings shared by the build and the chaincode workloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Default resources of the main step of the workload.
    #[serde(default)]
    pub resources: ResourcesConfig,
    /// Extra environment variables, applied after the platform ones.
    #[serde(default)]
    pub env: Vec<EnvVarConfig>,
}

/// A single `NAME=value` environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarConfig {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

fn default_init_image() -> String {
    DEFAULT_INIT_IMAGE.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LauncherConfig {
        serde_json::from_value(serde_json::json!({
            "namespace": "fabric",
            "file_server_url": "http://fileserver:8080",
            "images": { "GoLang": "hyperledger/fabric-ccenv:2.2" }
        }))
        .unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let config = config();

        assert_eq!(config.init_image, DEFAULT_INIT_IMAGE);
        assert_eq!(config.watch.poll_interval_ms, 2_000);
        assert!(config.builder.env.is_empty());
        assert!(config.peer_pod_name.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_image_lookup_ignores_case() {
        let config = config();

        assert_eq!(
            config.builder_image("golang"),
            Some("hyperledger/fabric-ccenv:2.2")
        );
        assert_eq!(config.builder_image("node"), None);
    }

    #[test]
    fn validation_rejects_missing_values() {
        let mut config = config();
        config.namespace = " ".to_owned();
        assert_eq!(config.validate(), Err(ValidationError::EmptyNamespace));

        let mut config = self::tests::config();
        config.watch.poll_interval_ms = 0;
        assert_eq!(config.validate(), Err(ValidationError::PollIntervalZero));

        let mut config = self::tests::config();
        config.builder.env.push(EnvVarConfig {
            name: String::new(),
            value: "x".to_owned(),
        });
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnnamedEnvVar("builder"))
        );
    }
}
