//! Environment-driven settings for the acceptance scenarios.
//!
//! Every variable is required and has no default; reading the settings is
//! the pre-check that runs before anything is provisioned.

use thiserror::Error;

pub const ENV_ACC: &str = "TF_ACC";

pub const OPENSTACK_USERNAME: &str = "KUBERMATIC_OPENSTACK_USERNAME";
pub const OPENSTACK_PASSWORD: &str = "KUBERMATIC_OPENSTACK_PASSWORD";
pub const OPENSTACK_TENANT: &str = "KUBERMATIC_OPENSTACK_TENANT";
pub const OPENSTACK_NODE_DC: &str = "KUBERMATIC_OPENSTACK_NODE_DC";
pub const OPENSTACK_IMAGE: &str = "KUBERMATIC_OPENSTACK_IMAGE";
pub const OPENSTACK_IMAGE2: &str = "KUBERMATIC_OPENSTACK_IMAGE2";
pub const OPENSTACK_FLAVOR: &str = "KUBERMATIC_OPENSTACK_FLAVOR";

pub const AZURE_CLIENT_ID: &str = "KUBERMATIC_AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET: &str = "KUBERMATIC_AZURE_CLIENT_SECRET";
pub const AZURE_TENANT_ID: &str = "KUBERMATIC_AZURE_TENANT_ID";
pub const AZURE_SUBSCRIPTION_ID: &str = "KUBERMATIC_AZURE_SUBSCRIPTION_ID";
pub const AZURE_NODE_DC: &str = "KUBERMATIC_AZURE_NODE_DC";
pub const AZURE_NODE_SIZE: &str = "KUBERMATIC_AZURE_NODE_SIZE";

pub const AWS_ACCESS_KEY_ID: &str = "KUBERMATIC_AWS_ACCESS_KEY_ID";
pub const AWS_ACCESS_KEY_SECRET: &str = "KUBERMATIC_AWS_ACCESS_KEY_SECRET";
pub const AWS_VPC_ID: &str = "KUBERMATIC_AWS_VPC_ID";
pub const AWS_NODE_DC: &str = "KUBERMATIC_AWS_NODE_DC";
pub const AWS_INSTANCE_TYPE: &str = "KUBERMATIC_AWS_INSTANCE_TYPE";
pub const AWS_SUBNET_ID: &str = "KUBERMATIC_AWS_SUBNET_ID";
pub const AWS_AVAILABILITY_ZONE: &str = "KUBERMATIC_AWS_AVAILABILITY_ZONE";
pub const AWS_DISK_SIZE: &str = "KUBERMATIC_AWS_DISK_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreCheckError {
    #[error("{0} must be set for acceptance tests")]
    MissingEnv(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    InvalidEnv {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

fn require(name: &'static str) -> Result<String, PreCheckError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(PreCheckError::MissingEnv(name)),
    }
}

/// Acceptance tests only run when `TF_ACC` is set, as with other Terraform
/// providers.
pub fn acceptance_enabled() -> bool {
    std::env::var_os(ENV_ACC).is_some_and(|v| !v.is_empty())
}

#[derive(Clone, PartialEq)]
pub struct OpenstackSettings {
    pub username: String,
    pub password: String,
    pub tenant: String,
    pub node_dc: String,
    pub image: String,
    pub image2: String,
    pub flavor: String,
}

impl OpenstackSettings {
    pub fn from_env() -> Result<Self, PreCheckError> {
        Ok(Self {
            username: require(OPENSTACK_USERNAME)?,
            password: require(OPENSTACK_PASSWORD)?,
            tenant: require(OPENSTACK_TENANT)?,
            node_dc: require(OPENSTACK_NODE_DC)?,
            image: require(OPENSTACK_IMAGE)?,
            image2: require(OPENSTACK_IMAGE2)?,
            flavor: require(OPENSTACK_FLAVOR)?,
        })
    }
}

#[derive(Clone, PartialEq)]
pub struct AzureSettings {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
    pub node_dc: String,
    pub node_size: String,
}

impl AzureSettings {
    pub fn from_env() -> Result<Self, PreCheckError> {
        Ok(Self {
            client_id: require(AZURE_CLIENT_ID)?,
            client_secret: require(AZURE_CLIENT_SECRET)?,
            tenant_id: require(AZURE_TENANT_ID)?,
            subscription_id: require(AZURE_SUBSCRIPTION_ID)?,
            node_dc: require(AZURE_NODE_DC)?,
            node_size: require(AZURE_NODE_SIZE)?,
        })
    }
}

#[derive(Clone, PartialEq)]
pub struct AwsSettings {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub vpc_id: String,
    pub node_dc: String,
    pub instance_type: String,
    pub subnet_id: String,
    pub availability_zone: String,
    pub disk_size: i64,
}

impl AwsSettings {
    pub fn from_env() -> Result<Self, PreCheckError> {
        let disk_size = require(AWS_DISK_SIZE)?;
        let disk_size = disk_size
            .parse()
            .map_err(|_| PreCheckError::InvalidEnv {
                name: AWS_DISK_SIZE,
                expected: "an integer number of GB",
                value: disk_size,
            })?;

        Ok(Self {
            access_key_id: require(AWS_ACCESS_KEY_ID)?,
            access_key_secret: require(AWS_ACCESS_KEY_SECRET)?,
            vpc_id: require(AWS_VPC_ID)?,
            node_dc: require(AWS_NODE_DC)?,
            instance_type: require(AWS_INSTANCE_TYPE)?,
            subnet_id: require(AWS_SUBNET_ID)?,
            availability_zone: require(AWS_AVAILABILITY_ZONE)?,
            disk_size,
        })
    }
}

macro_rules! redacted_debug {
    ($ty:ident, [$($shown:ident),*]) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($shown), &self.$shown))*
                    .finish_non_exhaustive()
            }
        }
    };
}

redacted_debug!(OpenstackSettings, [tenant, node_dc, image, image2, flavor]);
redacted_debug!(AzureSettings, [node_dc, node_size]);
redacted_debug!(AwsSettings, [vpc_id, node_dc, instance_type, subnet_id, availability_zone, disk_size]);
