use k8scc_config::load_config;
use k8scc_config::shared::LauncherConfig;
use std::env;

/// Set by Kubernetes to the name of the pod the peer runs in.
const HOSTNAME_ENV: &str = "HOSTNAME";

/// Peer address override understood by older deployments.
const PEER_URL_ENV: &str = "EXTERNAL_BUILDER_PEER_URL";

/// Loads the [`LauncherConfig`], completes it from the environment and validates it.
pub fn load_launcher_config() -> anyhow::Result<LauncherConfig> {
    let mut config = load_config::<LauncherConfig>()?;
    apply_environment(
        &mut config,
        env::var(HOSTNAME_ENV)
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(kernel_hostname),
        env::var(PEER_URL_ENV).ok(),
    );
    config.validate()?;

    Ok(config)
}

/// Hostname of the machine, which is the pod name inside Kubernetes.
///
/// The peer starts builders with a stripped environment, so `HOSTNAME` is
/// usually missing there.
fn kernel_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
}

/// Fills the peer pod name and peer address left unset by the configuration files.
fn apply_environment(
    config: &mut LauncherConfig,
    hostname: Option<String>,
    peer_url: Option<String>,
) {
    if config.peer_pod_name.is_none() {
        config.peer_pod_name = hostname.filter(|name| !name.is_empty());
    }
    if config.peer_address.is_none() {
        config.peer_address = peer_url.filter(|url| !url.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &[(&str, &str)]) -> LauncherConfig {
        let mut value = serde_json::json!({
            "namespace": "fabric",
            "file_server_url": "http://fileserver:8080",
        });
        for (key, field) in extra {
            value[*key] = serde_json::Value::String((*field).to_owned());
        }

        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn environment_fills_missing_peer_settings() {
        let mut config = config(&[]);
        apply_environment(
            &mut config,
            Some("peer0-7d9f".to_owned()),
            Some("peer0:7052".to_owned()),
        );

        assert_eq!(config.peer_pod_name.as_deref(), Some("peer0-7d9f"));
        assert_eq!(config.peer_address.as_deref(), Some("peer0:7052"));
    }

    #[test]
    fn configuration_files_win_over_environment() {
        let mut config = config(&[("peer_pod_name", "peer1"), ("peer_address", "peer1:7052")]);
        apply_environment(
            &mut config,
            Some("peer0-7d9f".to_owned()),
            Some("peer0:7052".to_owned()),
        );

        assert_eq!(config.peer_pod_name.as_deref(), Some("peer1"));
        assert_eq!(config.peer_address.as_deref(), Some("peer1:7052"));
    }

    #[test]
    fn kernel_hostname_names_the_peer_pod_without_environment() {
        let mut config = config(&[]);
        apply_environment(&mut config, kernel_hostname(), None);

        let expected = hostname::get().unwrap().into_string().unwrap();
        assert_eq!(config.peer_pod_name, Some(expected).filter(|name| !name.is_empty()));
    }

    #[test]
    fn empty_environment_values_are_ignored() {
        let mut config = config(&[]);
        apply_environment(&mut config, Some(String::new()), None);

        assert!(config.peer_pod_name.is_none());
        assert!(config.peer_address.is_none());
    }
}
