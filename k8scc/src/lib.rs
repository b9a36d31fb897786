//! Builds and runs Hyperledger Fabric chaincode as Kubernetes pods.
//!
//! The peer invokes the launcher once per phase. `build` ships the chaincode
//! source to the exchange store and runs a one-shot build pod that compiles it
//! and uploads the output under the same build identifier. `run` starts a
//! long-lived chaincode pod that downloads that output and connects back to the
//! peer. Both pods are owned by the peer pod, so the cluster reaps them when the
//! peer goes away.
//!
//! The cluster is reached through the [`k8s::K8sClient`] trait, whose default
//! implementation is backed by [`kube`].

pub mod archive;
pub mod build_id;
pub mod cleanup;
pub mod concurrency;
pub mod error;
pub mod exchange;
mod fs;
pub mod k8s;
pub mod metadata;
pub mod platform;
pub mod pod;
pub mod procedures;
pub mod resources;
pub mod tls;
pub mod watcher;
