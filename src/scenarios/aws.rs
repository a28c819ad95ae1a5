use std::collections::BTreeMap;

use super::{CLUSTER_VERSION, KUBELET_VERSION_17, Scenario};
use crate::acctest::check::{
    compose_aggregate, node_deployment_exists, resource_attr, resource_attr_from,
};
use crate::acctest::env::{AwsSettings, PreCheckError};
use crate::acctest::{Snapshot, TestStep};
use crate::api::NodeDeployment;
use crate::terraform::config::{
    AccConfig, ClusterCloud, ClusterConfig, NODE_DEPLOYMENT_ADDRESS as ND, NodeCloud,
    NodeDeploymentConfig, ProjectConfig,
};

/// Sent exactly as written; the API stores it verbatim.
pub const VOLUME_TYPE: &str = "standart";

const AWS: &str = "spec.0.template.0.cloud.0.aws.0";

#[derive(Debug)]
pub struct AwsScenario {
    settings: AwsSettings,
}

impl AwsScenario {
    pub fn new(settings: AwsSettings) -> Self {
        Self { settings }
    }

    pub fn from_env() -> Result<Self, PreCheckError> {
        Ok(Self::new(AwsSettings::from_env()?))
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
                cloud: ClusterCloud::Aws {
                    access_key_id: s.access_key_id.clone(),
                    access_key_secret: s.access_key_secret.clone(),
                    vpc_id: s.vpc_id.clone(),
                },
            },
            node_deployment: NodeDeploymentConfig {
                name: name.to_string(),
                replicas: 2,
                labels: BTreeMap::new(),
                cloud: NodeCloud::Aws {
                    instance_type: s.instance_type.clone(),
                    disk_size: s.disk_size,
                    volume_type: VOLUME_TYPE.to_string(),
                    subnet_id: s.subnet_id.clone(),
                    availability_zone: s.availability_zone.clone(),
                    assign_public_ip: true,
                },
                dist_upgrade_on_boot: Some(false),
                kubelet: KUBELET_VERSION_17.to_string(),
            },
        }
    }
}

impl Scenario for AwsScenario {
    fn name(&self) -> &str {
        "aws"
    }

    fn steps(&self, name: &str) -> Vec<TestStep> {
        let s = &self.settings;
        let nodedepl: Snapshot<NodeDeployment> = Snapshot::new();

        let step = TestStep {
            config: self.config(name),
            check: compose_aggregate(vec![
                node_deployment_exists(ND, &nodedepl),
                resource_attr(ND, format!("{AWS}.instance_type"), s.instance_type.as_str()),
                resource_attr_from(
                    ND,
                    format!("{AWS}.instance_type"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().and_then(|a| a.instance_type.clone()),
                ),
                resource_attr(ND, format!("{AWS}.disk_size"), s.disk_size.to_string()),
                resource_attr_from(
                    ND,
                    format!("{AWS}.disk_size"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().and_then(|a| a.volume_size).map(|v| v.to_string()),
                ),
                resource_attr(ND, format!("{AWS}.volume_type"), VOLUME_TYPE),
                resource_attr_from(
                    ND,
                    format!("{AWS}.volume_type"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().and_then(|a| a.volume_type.clone()),
                ),
                resource_attr(ND, format!("{AWS}.subnet_id"), s.subnet_id.as_str()),
                resource_attr_from(
                    ND,
                    format!("{AWS}.subnet_id"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().map(|a| a.subnet_id.clone()),
                ),
                resource_attr(
                    ND,
                    format!("{AWS}.availability_zone"),
                    s.availability_zone.as_str(),
                ),
                resource_attr_from(
                    ND,
                    format!("{AWS}.availability_zone"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().map(|a| a.availability_zone.clone()),
                ),
                resource_attr(ND, format!("{AWS}.assign_public_ip"), "true"),
                resource_attr_from(
                    ND,
                    format!("{AWS}.assign_public_ip"),
                    &nodedepl,
                    |nd: &NodeDeployment| nd.aws().map(|a| a.assign_public_ip.to_string()),
                ),
            ]),
        };

        vec![step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> AwsScenario {
        AwsScenario::new(AwsSettings {
            access_key_id: "AKIAEXAMPLE".to_string(),
            access_key_secret: "secret".to_string(),
            vpc_id: "vpc-0815".to_string(),
            node_dc: "aws-eu-central-1a".to_string(),
            instance_type: "t3.small".to_string(),
            subnet_id: "subnet-42".to_string(),
            availability_zone: "eu-central-1a".to_string(),
            disk_size: 25,
        })
    }

    #[test]
    fn test_config_render() {
        let hcl = scenario().config("tf-acc-test-3").render();
        assert!(hcl.contains("vpc_id = \"vpc-0815\"\n"));
        assert!(hcl.contains("instance_type = \"t3.small\""));
        assert!(hcl.contains("disk_size = 25"));
        assert!(hcl.contains("volume_type = \"standart\""));
        assert!(hcl.contains("subnet_id = \"subnet-42\""));
        assert!(hcl.contains("availability_zone = \"eu-central-1a\""));
        assert!(hcl.contains("assign_public_ip = true"));
    }

    #[test]
    fn test_case_single_step() {
        let case = scenario().test_case();
        assert_eq!(case.steps.len(), 1);
        assert!(case.name.starts_with("aws/"));
    }
}
