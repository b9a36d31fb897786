//! Pod specifications of the build and chaincode workloads.
//!
//! Both workloads share one `emptyDir` volume mounted at `/chaincode`. Each
//! pipeline step is its own init container so a failing step stops the pod
//! before any later step runs.

mod build;
mod common;
mod run;

pub use build::*;
pub use common::*;
pub use run::*;
