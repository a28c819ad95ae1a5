mod client;
mod error;
pub mod types;

pub use client::KubermaticClient;
pub use error::ApiError;
pub use types::{
    AwsNodeSpec, AzureNodeSpec, Cluster, NodeCloudSpec, NodeDeployment, NodeDeploymentSpec,
    NodeSpec, NodeVersionInfo, OpenstackNodeSpec, OperatingSystemSpec, Project, UbuntuSpec,
};
