use serde::{Deserialize, Serialize};

/// CPU and memory limits/requests of a workload container.
///
/// Every field is optional and independent of the others: a limit without a
/// matching request (or the reverse) is valid. Values use the Kubernetes
/// quantity notation (`"512Mi"`, `"250m"`). Empty strings are treated as unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_cpu: Option<String>,
}
