//! Mutual TLS material handed to the chaincode container.
//!
//! The material is written by an init step into the `artifacts` directory of
//! the shared volume. The client key and certificate are written twice: as
//! PEM, and base64 encoded for the Node runtime which expects them wrapped.

use base64::{Engine, prelude::BASE64_STANDARD};
use k8s_openapi::api::core::v1::EnvVar;
use secrecy::{ExposeSecret, SecretString};

/// Mount point of the artifacts directory in every container.
pub const ARTIFACTS_DIR: &str = "/chaincode/artifacts";

pub const ROOT_CERT_FILE: &str = "root.crt";
pub const CLIENT_PEM_KEY_FILE: &str = "client_pem.key";
pub const CLIENT_PEM_CERT_FILE: &str = "client_pem.crt";
pub const CLIENT_KEY_FILE: &str = "client.key";
pub const CLIENT_CERT_FILE: &str = "client.crt";

/// One file written into [`ARTIFACTS_DIR`].
pub struct ArtifactFile {
    pub name: &'static str,
    pub contents: String,
}

/// PEM encoded TLS material of a chaincode.
#[derive(Debug, Clone)]
pub struct TlsArtifacts {
    pub root_cert: String,
    pub client_cert: String,
    pub client_key: SecretString,
}

impl TlsArtifacts {
    /// TLS is disabled if and only if the client certificate is empty.
    pub fn is_enabled(&self) -> bool {
        !self.client_cert.is_empty()
    }

    /// The files to provision, in the order they are written.
    pub fn files(&self) -> Vec<ArtifactFile> {
        let client_key = self.client_key.expose_secret();

        vec![
            ArtifactFile {
                name: ROOT_CERT_FILE,
                contents: self.root_cert.clone(),
            },
            ArtifactFile {
                name: CLIENT_PEM_KEY_FILE,
                contents: client_key.to_owned(),
            },
            ArtifactFile {
                name: CLIENT_PEM_CERT_FILE,
                contents: self.client_cert.clone(),
            },
            ArtifactFile {
                name: CLIENT_KEY_FILE,
                contents: BASE64_STANDARD.encode(client_key),
            },
            ArtifactFile {
                name: CLIENT_CERT_FILE,
                contents: BASE64_STANDARD.encode(&self.client_cert),
            },
        ]
    }

    /// Shell script writing every file of [`TlsArtifacts::files`].
    ///
    /// Each file is written through a quoted heredoc so its content is never
    /// expanded by the shell, and `head -c -1` drops the newline the heredoc
    /// appends.
    pub fn populate_script(&self) -> String {
        let mut script = format!("set -e\nmkdir -p {ARTIFACTS_DIR}\n");
        for (index, file) in self.files().iter().enumerate() {
            let marker = format!("EOF_{}", index + 1);
            script.push_str(&format!(
                "head -c -1 <<'{marker}' > {ARTIFACTS_DIR}/{name}\n{contents}\n{marker}\n",
                name = file.name,
                contents = file.contents,
            ));
        }

        script
    }

    /// Environment telling the chaincode shim where its TLS material lives.
    pub fn env(&self) -> Vec<EnvVar> {
        let path = |file: &str| format!("{ARTIFACTS_DIR}/{file}");

        vec![
            env_var("CORE_TLS_CLIENT_CERT_PATH", path(CLIENT_CERT_FILE)),
            env_var("CORE_TLS_CLIENT_KEY_PATH", path(CLIENT_KEY_FILE)),
            env_var("CORE_TLS_CLIENT_CERT_FILE", path(CLIENT_PEM_CERT_FILE)),
            env_var("CORE_TLS_CLIENT_KEY_FILE", path(CLIENT_PEM_KEY_FILE)),
            env_var("CORE_PEER_TLS_ROOTCERT_FILE", path(ROOT_CERT_FILE)),
            env_var("CORE_PEER_TLS_ENABLED", self.is_enabled().to_string()),
        ]
    }
}

pub(crate) fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.into()),
        ..EnvVar::default()
    }
}
