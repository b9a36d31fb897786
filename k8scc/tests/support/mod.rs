pub mod exchange;
pub mod fixtures;
pub mod k8s_client;
