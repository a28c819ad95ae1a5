//! Composite Terraform resource identifiers.
//!
//! The Kubermatic API addresses a node deployment by four path segments, but
//! Terraform keeps a single string per resource. The segments are packed as
//! `project:datacenter:cluster:nodedeployment` and unpacked again on every
//! read, update and delete.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("malformed id '{id}': expected {expected} non-empty segments separated by ':'")]
    Malformed { id: String, expected: usize },

    #[error("{segment} must not be empty")]
    EmptySegment { segment: &'static str },
}

/// Identifies a node deployment: `project:datacenter:cluster:nodedeployment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeDeploymentId {
    pub project_id: String,
    pub datacenter: String,
    pub cluster_id: String,
    pub node_deployment_id: String,
}

/// Identifies a cluster: `project:datacenter:cluster`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub project_id: String,
    pub datacenter: String,
    pub cluster_id: String,
}

pub fn encode(
    project_id: &str,
    datacenter: &str,
    cluster_id: &str,
    node_deployment_id: &str,
) -> Result<String, IdError> {
    require("project id", project_id)?;
    require("datacenter", datacenter)?;
    require("cluster id", cluster_id)?;
    require("node deployment id", node_deployment_id)?;
    Ok([project_id, datacenter, cluster_id, node_deployment_id].join(":"))
}

pub fn decode(id: &str) -> Result<NodeDeploymentId, IdError> {
    let [project_id, datacenter, cluster_id, node_deployment_id] = split::<4>(id)?;
    Ok(NodeDeploymentId {
        project_id,
        datacenter,
        cluster_id,
        node_deployment_id,
    })
}

fn require(segment: &'static str, value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::EmptySegment { segment });
    }
    Ok(())
}

fn split<const N: usize>(id: &str) -> Result<[String; N], IdError> {
    let malformed = || IdError::Malformed {
        id: id.to_string(),
        expected: N,
    };

    let parts: Vec<String> = id.split(DELIMITER).map(str::to_string).collect();
    if parts.iter().any(String::is_empty) {
        return Err(malformed());
    }
    parts.try_into().map_err(|_| malformed())
}

impl NodeDeploymentId {
    pub fn new(
        project_id: impl Into<String>,
        datacenter: impl Into<String>,
        cluster_id: impl Into<String>,
        node_deployment_id: impl Into<String>,
    ) -> Result<Self, IdError> {
        let id = Self {
            project_id: project_id.into(),
            datacenter: datacenter.into(),
            cluster_id: cluster_id.into(),
            node_deployment_id: node_deployment_id.into(),
        };
        encode(
            &id.project_id,
            &id.datacenter,
            &id.cluster_id,
            &id.node_deployment_id,
        )?;
        Ok(id)
    }

    pub fn cluster(&self) -> ClusterId {
        ClusterId {
            project_id: self.project_id.clone(),
            datacenter: self.datacenter.clone(),
            cluster_id: self.cluster_id.clone(),
        }
    }
}

impl ClusterId {
    pub fn new(
        project_id: impl Into<String>,
        datacenter: impl Into<String>,
        cluster_id: impl Into<String>,
    ) -> Result<Self, IdError> {
        let id = Self {
            project_id: project_id.into(),
            datacenter: datacenter.into(),
            cluster_id: cluster_id.into(),
        };
        require("project id", &id.project_id)?;
        require("datacenter", &id.datacenter)?;
        require("cluster id", &id.cluster_id)?;
        Ok(id)
    }

    pub fn node_deployment(
        &self,
        node_deployment_id: impl Into<String>,
    ) -> Result<NodeDeploymentId, IdError> {
        NodeDeploymentId::new(
            self.project_id.clone(),
            self.datacenter.clone(),
            self.cluster_id.clone(),
            node_deployment_id,
        )
    }
}

impl fmt::Display for NodeDeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.project_id, self.datacenter, self.cluster_id, self.node_deployment_id
        )
    }
}

impl FromStr for NodeDeploymentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.project_id, self.datacenter, self.cluster_id
        )
    }
}

impl FromStr for ClusterId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [project_id, datacenter, cluster_id] = split::<3>(s)?;
        Ok(Self {
            project_id,
            datacenter,
            cluster_id,
        })
    }
}
