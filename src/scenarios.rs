pub mod aws;
pub mod azure;
pub mod openstack;

use thiserror::Error;

use crate::acctest::check::node_deployment_destroyed;
use crate::acctest::{PreCheckError, TestCase, TestStep, random_test_name};

pub const CLUSTER_VERSION: &str = "1.17.6";
pub const KUBELET_VERSION_16: &str = "1.16.10";
pub const KUBELET_VERSION_17: &str = "1.17.6";

pub const SCENARIOS: &[&str] = &["openstack", "azure", "aws"];

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("pre-check failed: {0}")]
    PreCheck(#[from] PreCheckError),
}

pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    /// Steps for a run in which the project, cluster and node deployment are
    /// all named `resource_name`.
    fn steps(&self, resource_name: &str) -> Vec<TestStep>;

    fn test_case_named(&self, resource_name: &str) -> TestCase {
        TestCase {
            name: format!("{}/{resource_name}", self.name()),
            steps: self.steps(resource_name),
            check_destroy: node_deployment_destroyed(),
        }
    }

    /// Builds a fresh test case with a new random resource name.
    fn test_case(&self) -> TestCase {
        self.test_case_named(&random_test_name())
    }
}

/// Resolves a scenario by name. Reading its settings from the environment is
/// the pre-check, so a missing variable fails here before anything runs.
pub fn get_scenario(name: &str) -> Result<Box<dyn Scenario>, ScenarioError> {
    match name {
        "openstack" => Ok(Box::new(openstack::OpenstackScenario::from_env()?)),
        "azure" => Ok(Box::new(azure::AzureScenario::from_env()?)),
        "aws" => Ok(Box::new(aws::AwsScenario::from_env()?)),
        other => Err(ScenarioError::UnknownScenario(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scenario_unknown() {
        match get_scenario("gcp") {
            Err(ScenarioError::UnknownScenario(name)) => assert_eq!(name, "gcp"),
            other => panic!("expected UnknownScenario error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_pre_check_error_conversion() {
        let err: ScenarioError = PreCheckError::MissingEnv("KUBERMATIC_AWS_VPC_ID").into();
        assert_eq!(
            err.to_string(),
            "pre-check failed: KUBERMATIC_AWS_VPC_ID must be set for acceptance tests"
        );
    }

    #[test]
    fn test_case_name_is_prefixed_with_scenario() {
        let settings = crate::acctest::env::AzureSettings {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            tenant_id: "tid".to_string(),
            subscription_id: "sid".to_string(),
            node_dc: "azure-westeurope".to_string(),
            node_size: "Standard_F1".to_string(),
        };
        let case = azure::AzureScenario::new(settings).test_case_named("tf-acc-test-fixed");
        assert_eq!(case.name, "azure/tf-acc-test-fixed");
    }

    #[test]
    fn test_known_scenarios() {
        assert_eq!(SCENARIOS, &["openstack", "azure", "aws"]);
    }
}
