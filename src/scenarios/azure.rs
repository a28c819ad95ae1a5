use std::collections::BTreeMap;

use super::{CLUSTER_VERSION, KUBELET_VERSION_17, Scenario};
use crate::acctest::check::{compose_aggregate, node_deployment_exists, resource_attr};
use crate::acctest::env::{AzureSettings, PreCheckError};
use crate::acctest::{Snapshot, TestStep};
use crate::terraform::config::{
    AccConfig, ClusterCloud, ClusterConfig, NODE_DEPLOYMENT_ADDRESS as ND, NodeCloud,
    NodeDeploymentConfig, ProjectConfig,
};

#[derive(Debug)]
pub struct AzureScenario {
    settings: AzureSettings,
}

impl AzureScenario {
    pub fn new(settings: AzureSettings) -> Self {
        Self { settings }
    }

    pub fn from_env() -> Result<Self, PreCheckError> {
        Ok(Self::new(AzureSettings::from_env()?))
    }

    pub fn config(&self, name: &str) -> AccConfig {
        let s = &self.settings;
        AccConfig {
            project: ProjectConfig {
                name: name.to_string(),
                labels: BTreeMap::new(),
            },
            cluster: ClusterConfig {
                name: name.to_string(),
                dc_name: s.node_dc.clone(),
                version: CLUSTER_VERSION.to_string(),
                labels: BTreeMap::new(),
                cloud: ClusterCloud::Azure {
                    client_id: s.client_id.clone(),
                    client_secret: s.client_secret.clone(),
                    tenant_id: s.tenant_id.clone(),
                    subscription_id: s.subscription_id.clone(),
                },
            },
            node_deployment: NodeDeploymentConfig {
                name: name.to_string(),
                replicas: 2,
                labels: BTreeMap::new(),
                cloud: NodeCloud::Azure {
                    size: s.node_size.clone(),
                },
                dist_upgrade_on_boot: Some(false),
                kubelet: KUBELET_VERSION_17.to_string(),
            },
        }
    }
}

impl Scenario for AzureScenario {
    fn name(&self) -> &str {
        "azure"
    }

    fn steps(&self, name: &str) -> Vec<TestStep> {
        let nodedepl = Snapshot::new();

        vec![TestStep {
            config: self.config(name),
            check: compose_aggregate(vec![
                node_deployment_exists(ND, &nodedepl),
                resource_attr(
                    ND,
                    "spec.0.template.0.cloud.0.azure.0.size",
                    self.settings.node_size.as_str(),
                ),
            ]),
        }]
    }
}
