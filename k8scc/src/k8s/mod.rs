//! Kubernetes integration of the launcher.
//!
//! Procedures depend on the [`K8sClient`] trait only. The default client,
//! [`http::HttpK8sClient`], is backed by the [`kube`] crate and talks to the
//! cluster using the ambient configuration (the peer's service account when
//! running in-cluster, `~/.kube/config` otherwise). Tests swap in scripted
//! implementations.
//!
//! See [`base`] for errors, pod phase mapping, and the client trait.

mod base;
pub mod http;

pub use base::*;
