use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::api::{Api, DeleteParams, PostParams};
use tracing::debug;

use crate::k8s::{K8sClient, K8sError};

/// [`K8sClient`] talking to the API server through [`kube`].
#[derive(Debug)]
pub struct HttpK8sClient {
    pods_api: Api<Pod>,
}

impl HttpK8sClient {
    /// Creates a client for pods in `namespace` from the ambient configuration.
    pub async fn new(namespace: &str) -> Result<HttpK8sClient, K8sError> {
        let client = Client::try_default().await?;

        Ok(HttpK8sClient {
            pods_api: Api::namespaced(client, namespace),
        })
    }
}

#[async_trait]
impl K8sClient for HttpK8sClient {
    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, K8sError> {
        Ok(self.pods_api.get_opt(name).await?)
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, K8sError> {
        Ok(self.pods_api.create(&PostParams::default(), pod).await?)
    }

    async fn delete_pod(&self, name: &str) -> Result<(), K8sError> {
        match self.pods_api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = K8sError::from(err);
                if !err.is_not_found() {
                    return Err(err);
                }

                debug!(pod = name, "pod already gone");
                Ok(())
            }
        }
    }
}
