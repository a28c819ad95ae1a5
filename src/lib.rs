//! kubermatic-acc - acceptance testing for the Kubermatic Terraform provider
//!
//! Applies typed Terraform configurations for projects, clusters and node
//! deployments, then checks the resulting state against the Kubermatic API.

pub mod acctest;
pub mod api;
pub mod id;
pub mod output;
pub mod scenarios;
pub mod terraform;

mod error;

pub use acctest::{AccContext, CaseReport, TestCase};
pub use api::{ApiError, KubermaticClient, NodeDeployment};
pub use error::Error;
pub use id::{ClusterId, IdError, NodeDeploymentId};
