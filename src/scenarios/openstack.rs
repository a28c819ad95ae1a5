use std::collections::BTreeMap;

use super::{CLUSTER_VERSION, KUBELET_VERSION_16, KUBELET_VERSION_17, Scenario};
use crate::acctest::check::{
    ExpectedOpenstack, compose_aggregate, node_deployment_exists, node_deployment_id_unchanged,
    openstack_node_deployment_fields, resource_attr, resource_attr_from,
};
use crate::acctest::env::{OpenstackSettings, PreCheckError};
use crate::acctest::{Snapshot, TestStep};
use crate::api::NodeDeployment;
use crate::terraform::config::{
    AccConfig, ClusterCloud, ClusterConfig, NODE_DEPLOYMENT_ADDRESS as ND, NodeCloud,
    NodeDeploymentConfig, ProjectConfig,
};

const FLOATING_IP_POOL: &str = "ext-net";
const UPDATED_DISK_SIZE: i64 = 123;

/// Creates a node deployment, then updates replicas, kubelet, image, floating
/// IP, disk size and dist-upgrade in place.
#[derive(Debug)]
pub struct OpenstackScenario {
    settings: OpenstackSettings,
}

fn labels(key: &str, value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(key.to_string(), value.to_string())])
}

impl OpenstackScenario {
    pub fn new(settings: OpenstackSettings) -> Self {
        Self { settings }
    }

    pub fn from_env() -> Result<Self, PreCheckError> {
        Ok(Self::new(OpenstackSettings::from_env()?))
    }

    /// Initial configuration: one replica, no floating IP, no dist upgrade.
    pub fn basic_config(&self, name: &str) -> AccConfig {
        let s = &self.settings;
        AccConfig {
            project: ProjectConfig {
                name: name.to_string(),
                labels: BTreeMap::new(),
            },
            cluster: self.cluster(name, BTreeMap::new()),
            node_deployment: NodeDeploymentConfig {
                name: name.to_string(),
                replicas: 1,
                labels: BTreeMap::new(),
                cloud: NodeCloud::Openstack {
                    flavor: s.flavor.clone(),
                    image: s.image.clone(),
                    use_floating_ip: None,
                    disk_size: None,
                },
                dist_upgrade_on_boot: None,
                kubelet: KUBELET_VERSION_16.to_string(),
            },
        }
    }

    /// Updated configuration applied on top of [`Self::basic_config`].
    pub fn updated_config(&self, name: &str) -> AccConfig {
        let s = &self.settings;
        AccConfig {
            project: ProjectConfig {
                name: name.to_string(),
                labels: labels("project-label", "val"),
            },
            cluster: self.cluster(name, labels("cluster-label", "val")),
            node_deployment: NodeDeploymentConfig {
                name: name.to_string(),
                replicas: 2,
                labels: labels("foo", "bar"),
                cloud: NodeCloud::Openstack {
                    flavor: s.flavor.clone(),
                    image: s.image2.clone(),
                    use_floating_ip: Some(true),
                    disk_size: Some(UPDATED_DISK_SIZE),
                },
                dist_upgrade_on_boot: Some(true),
                kubelet: KUBELET_VERSION_17.to_string(),
            },
        }
    }

    fn cluster(&self, name: &str, labels: BTreeMap<String, String>) -> ClusterConfig {
        let s = &self.settings;
        ClusterConfig {
            name: name.to_string(),
            dc_name: s.node_dc.clone(),
            version: CLUSTER_VERSION.to_string(),
            labels,
            cloud: ClusterCloud::Openstack {
                tenant: s.tenant.clone(),
                username: s.username.clone(),
                password: s.password.clone(),
                floating_ip_pool: FLOATING_IP_POOL.to_string(),
            },
        }
    }
}

const FLAVOR: &str = "spec.0.template.0.cloud.0.openstack.0.flavor";
const IMAGE: &str = "spec.0.template.0.cloud.0.openstack.0.image";

impl Scenario for OpenstackScenario {
    fn name(&self) -> &str {
        "openstack"
    }

    fn steps(&self, name: &str) -> Vec<TestStep> {
        let s = &self.settings;
        let ndepl: Snapshot<NodeDeployment> = Snapshot::new();

        let step1 = TestStep {
            config: self.basic_config(name),
            check: compose_aggregate(vec![
                node_deployment_exists(ND, &ndepl),
                openstack_node_deployment_fields(
                    &ndepl,
                    ExpectedOpenstack {
                        flavor: s.flavor.clone(),
                        image: s.image.clone(),
                        kubelet: KUBELET_VERSION_16.to_string(),
                        replicas: 1,
                        disk_size: 0,
                        use_floating_ip: false,
                        dist_upgrade_on_boot: false,
                    },
                ),
                resource_attr(ND, "name", name),
                resource_attr_from(ND, "name", &ndepl, |nd: &NodeDeployment| {
                    Some(nd.name.clone())
                }),
                resource_attr(ND, "spec.0.replicas", "1"),
                resource_attr(ND, FLAVOR, s.flavor.as_str()),
                resource_attr(ND, IMAGE, s.image.as_str()),
                resource_attr(ND, "spec.0.template.0.operating_system.0.ubuntu.#", "1"),
                resource_attr(ND, "spec.0.template.0.versions.0.kubelet", KUBELET_VERSION_16),
            ]),
        };

        let step2 = TestStep {
            config: self.updated_config(name),
            check: compose_aggregate(vec![
                node_deployment_id_unchanged(ND, &ndepl),
                node_deployment_exists(ND, &ndepl),
                openstack_node_deployment_fields(
                    &ndepl,
                    ExpectedOpenstack {
                        flavor: s.flavor.clone(),
                        image: s.image2.clone(),
                        kubelet: KUBELET_VERSION_17.to_string(),
                        replicas: 2,
                        disk_size: UPDATED_DISK_SIZE,
                        use_floating_ip: true,
                        dist_upgrade_on_boot: true,
                    },
                ),
                resource_attr(ND, "name", name),
                resource_attr(ND, "spec.0.replicas", "2"),
                resource_attr(ND, FLAVOR, s.flavor.as_str()),
                resource_attr(ND, IMAGE, s.image2.as_str()),
                resource_attr(
                    ND,
                    "spec.0.template.0.cloud.0.openstack.0.use_floating_ip",
                    "true",
                ),
                resource_attr(
                    ND,
                    "spec.0.template.0.cloud.0.openstack.0.disk_size",
                    UPDATED_DISK_SIZE.to_string(),
                ),
                resource_attr(
                    ND,
                    "spec.0.template.0.operating_system.0.ubuntu.0.dist_upgrade_on_boot",
                    "true",
                ),
                resource_attr(ND, "spec.0.template.0.versions.0.kubelet", KUBELET_VERSION_17),
            ]),
        };

        vec![step1, step2]
    }
}
