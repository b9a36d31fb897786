//! Translation of CPU and memory settings into Kubernetes resource requirements.

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8scc_config::shared::ResourcesConfig;
use std::collections::BTreeMap;

const MEMORY: &str = "memory";
const CPU: &str = "cpu";

/// Merges per-chaincode `overrides` over the configuration `defaults`.
///
/// A non-empty override replaces the matching default, an empty or missing
/// one keeps it. Merging the result again with the same overrides yields the
/// same value.
pub fn merge_resources(defaults: &ResourcesConfig, overrides: &ResourcesConfig) -> ResourcesConfig {
    fn pick(default: &Option<String>, over: &Option<String>) -> Option<String> {
        non_empty(over).or_else(|| non_empty(default)).map(str::to_owned)
    }

    ResourcesConfig {
        limit_memory: pick(&defaults.limit_memory, &overrides.limit_memory),
        limit_cpu: pick(&defaults.limit_cpu, &overrides.limit_cpu),
        requests_memory: pick(&defaults.requests_memory, &overrides.requests_memory),
        requests_cpu: pick(&defaults.requests_cpu, &overrides.requests_cpu),
    }
}

/// Builds the container resource requirements for `resources`.
///
/// Limits and requests are left out entirely when none of their values is set.
pub fn resource_requirements(resources: &ResourcesConfig) -> ResourceRequirements {
    let limits = quantities(&resources.limit_memory, &resources.limit_cpu);
    let requests = quantities(&resources.requests_memory, &resources.requests_cpu);

    ResourceRequirements {
        limits,
        requests,
        ..ResourceRequirements::default()
    }
}

fn quantities(memory: &Option<String>, cpu: &Option<String>) -> Option<BTreeMap<String, Quantity>> {
    let mut list = BTreeMap::new();
    if let Some(memory) = non_empty(memory) {
        list.insert(MEMORY.to_owned(), Quantity(memory.to_owned()));
    }
    if let Some(cpu) = non_empty(cpu) {
        list.insert(CPU.to_owned(), Quantity(cpu.to_owned()));
    }

    (!list.is_empty()).then_some(list)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(value: &str) -> ResourcesConfig {
        ResourcesConfig {
            limit_memory: Some(value.to_owned()),
            ..ResourcesConfig::default()
        }
    }

    #[test]
    fn override_wins() {
        let merged = merge_resources(&memory("256Mi"), &memory("512Mi"));
        assert_eq!(merged, memory("512Mi"));
    }

    #[test]
    fn empty_override_keeps_default() {
        assert_eq!(
            merge_resources(&memory("256Mi"), &ResourcesConfig::default()),
            memory("256Mi")
        );
        assert_eq!(merge_resources(&memory("256Mi"), &memory("")), memory("256Mi"));
    }

    #[test]
    fn merge_is_idempotent() {
        let defaults = ResourcesConfig {
            limit_memory: Some("256Mi".to_owned()),
            requests_cpu: Some("100m".to_owned()),
            ..ResourcesConfig::default()
        };
        let overrides = ResourcesConfig {
            limit_cpu: Some("1".to_owned()),
            requests_cpu: Some("250m".to_owned()),
            ..ResourcesConfig::default()
        };

        let once = merge_resources(&defaults, &overrides);
        let twice = merge_resources(&once, &overrides);

        assert_eq!(once, twice);
        assert_eq!(once.limit_memory.as_deref(), Some("256Mi"));
        assert_eq!(once.limit_cpu.as_deref(), Some("1"));
        assert_eq!(once.requests_cpu.as_deref(), Some("250m"));
        assert_eq!(once.requests_memory, None);
    }

    #[test]
    fn limits_and_requests_are_independent() {
        let requirements = resource_requirements(&memory("1Gi"));

        let limits = requirements.limits.unwrap();
        assert_eq!(limits.get("memory"), Some(&Quantity("1Gi".to_owned())));
        assert!(!limits.contains_key("cpu"));
        assert!(requirements.requests.is_none());
    }
}
