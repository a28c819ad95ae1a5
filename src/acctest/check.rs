//! Assertions evaluated against Terraform state after each step.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use super::AccContext;
use crate::api::{ApiError, NodeDeployment};
use crate::id::{self, IdError};
use crate::terraform::{ResourceState, State, TerraformError};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("No Record ID is set for {0}")]
    NoId(String),

    #[error("{address}: attribute '{key}' not found")]
    AttributeMissing { address: String, key: String },

    #[error("{address}: attribute '{key}' expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        address: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("No Record")]
    NoRecord,

    #[error("No {0} spec present")]
    MissingSpec(&'static str),

    #[error("{field}={actual}, want {expected}")]
    FieldMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Id(#[from] IdError),

    #[error("GetNodeDeployment: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Custom(String),

    #[error("destroy failed: {0}")]
    Destroy(#[source] TerraformError),

    #[error("{} check(s) failed: {}", .0.len(), join(.0))]
    Aggregate(Vec<CheckError>),
}

fn join(errors: &[CheckError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
pub trait Check: Send + Sync {
    async fn check(&self, ctx: &AccContext, state: &State) -> Result<(), CheckError>;
}

pub type BoxCheck = Box<dyn Check>;

/// Last API view of an entity, written by an existence check and read by
/// the checks that follow it in the same step.
#[derive(Debug)]
pub struct Snapshot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Snapshot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self, value: T) {
        *self.lock() = Some(value);
    }

    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<T>> {
        // A poisoned slot still holds the last stored value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn resource<'a>(state: &'a State, address: &str) -> Result<&'a ResourceState, CheckError> {
    state
        .resource(address)
        .ok_or_else(|| CheckError::ResourceNotFound(address.to_string()))
}

struct ResourceAttr {
    address: String,
    key: String,
    expected: String,
}

#[async_trait]
impl Check for ResourceAttr {
    async fn check(&self, _ctx: &AccContext, state: &State) -> Result<(), CheckError> {
        compare_attr(resource(state, &self.address)?, &self.address, &self.key, &self.expected)
    }
}

fn compare_attr(
    rs: &ResourceState,
    address: &str,
    key: &str,
    expected: &str,
) -> Result<(), CheckError> {
    // An absent block counts as zero elements.
    let actual = match rs.attr(key) {
        Some(v) => v,
        None if (key.ends_with(".#") || key.ends_with(".%")) && expected == "0" => return Ok(()),
        None => {
            return Err(CheckError::AttributeMissing {
                address: address.to_string(),
                key: key.to_string(),
            });
        }
    };

    if actual != expected {
        return Err(CheckError::AttributeMismatch {
            address: address.to_string(),
            key: key.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Attribute `key` of `address` must equal `expected`.
pub fn resource_attr(
    address: impl Into<String>,
    key: impl Into<String>,
    expected: impl Into<String>,
) -> BoxCheck {
    Box::new(ResourceAttr {
        address: address.into(),
        key: key.into(),
        expected: expected.into(),
    })
}

type Extract<T> = fn(&T) -> Option<String>;

struct ResourceAttrFrom<T> {
    address: String,
    key: String,
    snapshot: Snapshot<T>,
    extract: Extract<T>,
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Check for ResourceAttrFrom<T> {
    async fn check(&self, _ctx: &AccContext, state: &State) -> Result<(), CheckError> {
        let record = self.snapshot.get().ok_or(CheckError::NoRecord)?;
        let expected = (self.extract)(&record).unwrap_or_default();
        compare_attr(resource(state, &self.address)?, &self.address, &self.key, &expected)
    }
}

/// Attribute `key` must equal the value extracted from the snapshot at the
/// time the check runs.
pub fn resource_attr_from<T: Clone + Send + Sync + 'static>(
    address: impl Into<String>,
    key: impl Into<String>,
    snapshot: &Snapshot<T>,
    extract: Extract<T>,
) -> BoxCheck {
    Box::new(ResourceAttrFrom {
        address: address.into(),
        key: key.into(),
        snapshot: snapshot.clone(),
        extract,
    })
}

struct NodeDeploymentExists {
    address: String,
    snapshot: Snapshot<NodeDeployment>,
}

#[async_trait]
impl Check for NodeDeploymentExists {
    async fn check(&self, ctx: &AccContext, state: &State) -> Result<(), CheckError> {
        let rs = resource(state, &self.address)?;
        if rs.id.is_empty() {
            return Err(CheckError::NoId(self.address.clone()));
        }

        let id = id::decode(&rs.id)?;
        let record = ctx.client.get_node_deployment(&id).await?;
        tracing::debug!(%id, name = %record.name, "node deployment exists");
        self.snapshot.store(record);
        Ok(())
    }
}

/// Fetches the node deployment behind `address` and records it in `snapshot`.
pub fn node_deployment_exists(
    address: impl Into<String>,
    snapshot: &Snapshot<NodeDeployment>,
) -> BoxCheck {
    Box::new(NodeDeploymentExists {
        address: address.into(),
        snapshot: snapshot.clone(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedOpenstack {
    pub flavor: String,
    pub image: String,
    pub kubelet: String,
    pub replicas: i32,
    pub disk_size: i64,
    pub use_floating_ip: bool,
    pub dist_upgrade_on_boot: bool,
}

struct OpenstackFields {
    snapshot: Snapshot<NodeDeployment>,
    expected: ExpectedOpenstack,
}

fn field<V: PartialEq + std::fmt::Display>(
    name: &'static str,
    actual: V,
    expected: V,
) -> Result<(), CheckError> {
    if actual != expected {
        return Err(CheckError::FieldMismatch {
            field: name,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

impl OpenstackFields {
    fn verify(&self, rec: &NodeDeployment) -> Result<(), CheckError> {
        let want = &self.expected;
        let template = rec.template().ok_or(CheckError::MissingSpec("Openstack cloud"))?;
        let openstack = rec.openstack().ok_or(CheckError::MissingSpec("Openstack cloud"))?;

        let flavor = openstack.flavor.as_deref().ok_or(CheckError::MissingSpec("Flavor"))?;
        field("Flavor", flavor, want.flavor.as_str())?;

        let image = openstack.image.as_deref().ok_or(CheckError::MissingSpec("Image"))?;
        field("Image", image, want.image.as_str())?;

        field("RootDiskSizeGB", openstack.root_disk_size_gb, want.disk_size)?;
        field("UseFloatingIP", openstack.use_floating_ip, want.use_floating_ip)?;

        let os = template
            .operating_system
            .as_ref()
            .ok_or(CheckError::MissingSpec("OperatingSystem"))?;
        let ubuntu = os.ubuntu.as_ref().ok_or(CheckError::MissingSpec("Ubuntu"))?;
        field(
            "Ubuntu.DistUpgradeOnBoot",
            ubuntu.dist_upgrade_on_boot,
            want.dist_upgrade_on_boot,
        )?;

        let versions = template
            .versions
            .as_ref()
            .ok_or(CheckError::MissingSpec("Versions"))?;
        field("Versions.Kubelet", versions.kubelet.as_str(), want.kubelet.as_str())?;

        let replicas = rec.spec.as_ref().and_then(|s| s.replicas);
        match replicas {
            Some(r) => field("Replicas", r, want.replicas),
            None => Err(CheckError::FieldMismatch {
                field: "Replicas",
                expected: want.replicas.to_string(),
                actual: "<unset>".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Check for OpenstackFields {
    async fn check(&self, _ctx: &AccContext, _state: &State) -> Result<(), CheckError> {
        let rec = self.snapshot.get().ok_or(CheckError::NoRecord)?;
        self.verify(&rec)
    }
}

/// Compares the recorded OpenStack node deployment field by field.
pub fn openstack_node_deployment_fields(
    snapshot: &Snapshot<NodeDeployment>,
    expected: ExpectedOpenstack,
) -> BoxCheck {
    Box::new(OpenstackFields {
        snapshot: snapshot.clone(),
        expected,
    })
}

struct IdUnchanged {
    address: String,
    snapshot: Snapshot<NodeDeployment>,
}

#[async_trait]
impl Check for IdUnchanged {
    async fn check(&self, _ctx: &AccContext, state: &State) -> Result<(), CheckError> {
        let rs = resource(state, &self.address)?;
        let id = id::decode(&rs.id)?;
        let previous = self.snapshot.get().ok_or(CheckError::NoRecord)?;
        if id.node_deployment_id != previous.id {
            return Err(CheckError::Custom(format!(
                "node deployment not updated. Want ID={}, got {}",
                previous.id, id.node_deployment_id
            )));
        }
        Ok(())
    }
}

/// The resource must still point at the node deployment recorded by an
/// earlier step, i.e. it was updated in place rather than replaced.
pub fn node_deployment_id_unchanged(
    address: impl Into<String>,
    snapshot: &Snapshot<NodeDeployment>,
) -> BoxCheck {
    Box::new(IdUnchanged {
        address: address.into(),
        snapshot: snapshot.clone(),
    })
}

struct Destroyed;

#[async_trait]
impl Check for Destroyed {
    async fn check(&self, _ctx: &AccContext, _state: &State) -> Result<(), CheckError> {
        Ok(())
    }
}

/// Destroy check for node deployments; deletion is not verified against the
/// API, so this always passes.
pub fn node_deployment_destroyed() -> BoxCheck {
    Box::new(Destroyed)
}

struct Aggregate(Vec<BoxCheck>);

#[async_trait]
impl Check for Aggregate {
    async fn check(&self, ctx: &AccContext, state: &State) -> Result<(), CheckError> {
        let mut errors = Vec::new();
        for check in &self.0 {
            if let Err(e) = check.check(ctx, state).await {
                errors.push(e);
            }
        }
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(CheckError::Aggregate(errors)),
        }
    }
}

/// Runs every check in order and reports all failures, not just the first.
pub fn compose_aggregate(checks: Vec<BoxCheck>) -> BoxCheck {
    Box::new(Aggregate(checks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        KubermaticClient, NodeCloudSpec, NodeDeploymentSpec, NodeSpec, NodeVersionInfo,
        OpenstackNodeSpec, OperatingSystemSpec, UbuntuSpec,
    };

    const ND: &str = "kubermatic_node_deployment.acctest_nd";

    fn ctx() -> AccContext {
        let client =
            KubermaticClient::new("http://127.0.0.1:9".to_string(), "t".to_string()).unwrap();
        AccContext::new(client)
    }

    fn state() -> State {
        State::from_json(
            r#"{"version": 4, "resources": [{
                "mode": "managed",
                "type": "kubermatic_node_deployment",
                "name": "acctest_nd",
                "instances": [{"attributes": {
                    "id": "p:dc:c:nd-1",
                    "name": "tf-acc-test-x",
                    "spec": [{"replicas": 1, "template": [{"operating_system": [{"ubuntu": [{}]}]}]}]
                }}]
            }]}"#,
        )
        .unwrap()
    }

    fn record() -> NodeDeployment {
        NodeDeployment {
            id: "nd-1".to_string(),
            name: "tf-acc-test-x".to_string(),
            spec: Some(NodeDeploymentSpec {
                replicas: Some(1),
                template: Some(NodeSpec {
                    cloud: Some(NodeCloudSpec {
                        openstack: Some(OpenstackNodeSpec {
                            flavor: Some("m1.small".to_string()),
                            image: Some("Ubuntu Bionic".to_string()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    operating_system: Some(OperatingSystemSpec {
                        ubuntu: Some(UbuntuSpec::default()),
                    }),
                    versions: Some(NodeVersionInfo {
                        kubelet: "1.16.10".to_string(),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn expected() -> ExpectedOpenstack {
        ExpectedOpenstack {
            flavor: "m1.small".to_string(),
            image: "Ubuntu Bionic".to_string(),
            kubelet: "1.16.10".to_string(),
            replicas: 1,
            disk_size: 0,
            use_floating_ip: false,
            dist_upgrade_on_boot: false,
        }
    }

    #[tokio::test]
    async fn test_resource_attr_match() {
        let check = resource_attr(ND, "spec.0.replicas", "1");
        assert!(check.check(&ctx(), &state()).await.is_ok());
    }

    #[tokio::test]
    async fn test_resource_attr_mismatch_names_both_values() {
        let check = resource_attr(ND, "spec.0.replicas", "2");
        let err = check.check(&ctx(), &state()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected \"2\""));
        assert!(msg.contains("got \"1\""));
    }

    #[tokio::test]
    async fn test_resource_attr_missing_resource() {
        let check = resource_attr("kubermatic_cluster.acctest_cluster", "name", "x");
        let err = check.check(&ctx(), &state()).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: kubermatic_cluster.acctest_cluster");
    }

    #[tokio::test]
    async fn test_block_count_attr() {
        let check = resource_attr(ND, "spec.0.template.0.operating_system.0.ubuntu.#", "1");
        assert!(check.check(&ctx(), &state()).await.is_ok());

        let absent = resource_attr(ND, "spec.0.template.0.cloud.#", "0");
        assert!(absent.check(&ctx(), &state()).await.is_ok());
    }

    #[tokio::test]
    async fn test_resource_attr_from_reads_snapshot_lazily() {
        let snapshot = Snapshot::new();
        let check = resource_attr_from(ND, "name", &snapshot, |nd: &NodeDeployment| {
            Some(nd.name.clone())
        });

        assert!(matches!(
            check.check(&ctx(), &state()).await,
            Err(CheckError::NoRecord)
        ));

        snapshot.store(record());
        assert!(check.check(&ctx(), &state()).await.is_ok());
    }

    #[tokio::test]
    async fn test_openstack_fields_match() {
        let snapshot = Snapshot::new();
        snapshot.store(record());
        let check = openstack_node_deployment_fields(&snapshot, expected());
        assert!(check.check(&ctx(), &state()).await.is_ok());
    }

    #[tokio::test]
    async fn test_openstack_fields_report_mismatch() {
        let snapshot = Snapshot::new();
        snapshot.store(record());
        let mut want = expected();
        want.disk_size = 123;
        let err = openstack_node_deployment_fields(&snapshot, want)
            .check(&ctx(), &state())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "RootDiskSizeGB=0, want 123");
    }

    #[tokio::test]
    async fn test_openstack_fields_missing_cloud() {
        let snapshot = Snapshot::new();
        let mut rec = record();
        if let Some(t) = rec.spec.as_mut().and_then(|s| s.template.as_mut()) {
            t.cloud = None;
        }
        snapshot.store(rec);
        let err = openstack_node_deployment_fields(&snapshot, expected())
            .check(&ctx(), &state())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No Openstack cloud spec present");
    }

    #[tokio::test]
    async fn test_id_unchanged() {
        let snapshot = Snapshot::new();
        snapshot.store(record());
        let check = node_deployment_id_unchanged(ND, &snapshot);
        assert!(check.check(&ctx(), &state()).await.is_ok());

        let mut replaced = record();
        replaced.id = "nd-2".to_string();
        snapshot.store(replaced);
        let err = check.check(&ctx(), &state()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "node deployment not updated. Want ID=nd-2, got nd-1"
        );
    }

    #[tokio::test]
    async fn test_destroyed_always_passes() {
        let empty = State::default();
        assert!(node_deployment_destroyed().check(&ctx(), &empty).await.is_ok());
        assert!(node_deployment_destroyed().check(&ctx(), &state()).await.is_ok());
    }

    #[tokio::test]
    async fn test_aggregate_collects_all_failures() {
        let check = compose_aggregate(vec![
            resource_attr(ND, "name", "tf-acc-test-x"),
            resource_attr(ND, "spec.0.replicas", "3"),
            resource_attr(ND, "missing", "x"),
        ]);
        match check.check(&ctx(), &state()).await {
            Err(CheckError::Aggregate(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected aggregate error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aggregate_single_failure_unwrapped() {
        let check = compose_aggregate(vec![resource_attr(ND, "spec.0.replicas", "3")]);
        assert!(matches!(
            check.check(&ctx(), &state()).await,
            Err(CheckError::AttributeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_exists_rejects_malformed_state_id() {
        let state = State::from_json(
            r#"{"version": 4, "resources": [{"mode": "managed", "type": "kubermatic_node_deployment",
                "name": "acctest_nd", "instances": [{"attributes": {"id": "nd-1"}}]}]}"#,
        )
        .unwrap();
        let err = node_deployment_exists(ND, &Snapshot::new())
            .check(&ctx(), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Id(IdError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_exists_requires_id() {
        let state = State::from_json(
            r#"{"version": 4, "resources": [{"mode": "managed", "type": "kubermatic_node_deployment",
                "name": "acctest_nd", "instances": [{"attributes": {"name": "x"}}]}]}"#,
        )
        .unwrap();
        let err = node_deployment_exists(ND, &Snapshot::new())
            .check(&ctx(), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::NoId(_)));
    }
}
