//! Live acceptance tests. They create real projects, clusters and machines,
//! so they only run when `TF_ACC` is set, along with `KUBERMATIC_HOST`,
//! `KUBERMATIC_TOKEN` and the per-cloud variables.

use kubermatic_acc::acctest::env::acceptance_enabled;
use kubermatic_acc::output::render_report;
use kubermatic_acc::scenarios::{Scenario, get_scenario};
use kubermatic_acc::terraform::config::DEFAULT_PROVIDER_SOURCE;
use kubermatic_acc::terraform::{ProviderConfig, ProviderEnv, Terraform};
use kubermatic_acc::{AccContext, KubermaticClient};

fn required(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set for acceptance tests"))
}

async fn run_scenario(name: &str) {
    if !acceptance_enabled() {
        eprintln!("skipping {name}: TF_ACC not set");
        return;
    }

    let scenario = get_scenario(name).unwrap();
    let host = required("KUBERMATIC_HOST");
    let token = required("KUBERMATIC_TOKEN");

    let ctx = AccContext::new(KubermaticClient::new(host.clone(), token.clone()).unwrap());
    let provider = ProviderConfig {
        source: std::env::var("KUBERMATIC_PROVIDER_SOURCE")
            .unwrap_or_else(|_| DEFAULT_PROVIDER_SOURCE.to_string()),
    };
    let binary = std::env::var("TF_ACC_TERRAFORM_PATH").unwrap_or_else(|_| "terraform".to_string());
    let tf = Terraform::new(binary, provider, ProviderEnv { host, token }).unwrap();

    let report = scenario.test_case().run(&ctx, &tf).await.unwrap();
    assert!(report.is_success(), "\n{}", render_report(&report));
}

#[tokio::test]
async fn test_acc_openstack_node_deployment_basic() {
    run_scenario("openstack").await;
}

#[tokio::test]
async fn test_acc_azure_node_deployment_basic() {
    run_scenario("azure").await;
}

#[tokio::test]
async fn test_acc_aws_node_deployment_basic() {
    run_scenario("aws").await;
}
