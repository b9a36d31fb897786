//! Scoped ownership of a pod that must not outlive the procedure using it.

use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

use crate::k8s::K8sClient;

/// Runs `fut`, then deletes the pod `pod` whatever the outcome.
///
/// The pod is deleted when `fut` returns, successfully or not, and when it
/// panics, in which case the panic resumes once the deletion was attempted.
/// Deletion failures are logged and never change the result of `fut`.
pub async fn with_pod_cleanup<C, F, T>(client: &C, pod: &str, fut: F) -> T
where
    C: K8sClient + ?Sized,
    F: Future<Output = T>,
{
    let result = AssertUnwindSafe(fut).catch_unwind().await;
    delete_pod_silently(client, pod).await;

    match result {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Deletes the pod `pod`, logging instead of returning any failure.
pub async fn delete_pod_silently<C>(client: &C, pod: &str)
where
    C: K8sClient + ?Sized,
{
    match client.delete_pod(pod).await {
        Ok(()) => info!(pod, "pod deleted"),
        Err(err) => warn!(pod, error = %err, "failed to delete pod"),
    }
}
