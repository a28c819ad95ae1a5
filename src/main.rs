mod cli;

use clap::Parser;
use color_eyre::eyre::{Result, bail};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use kubermatic_acc::acctest::env::acceptance_enabled;
use kubermatic_acc::acctest::sweep::{self, Swept};
use kubermatic_acc::scenarios::Scenario;
use kubermatic_acc::terraform::config::{NODE_DEPLOYMENT_ADDRESS, import_block};
use kubermatic_acc::terraform::{ProviderConfig, ProviderEnv, Terraform};
use kubermatic_acc::{AccContext, ClusterId, Error, KubermaticClient, id, output, scenarios};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            if !acceptance_enabled() {
                bail!("acceptance tests are disabled, set TF_ACC=1 to provision real infrastructure");
            }

            let scenario = scenarios::get_scenario(&args.scenario)?;
            let client = KubermaticClient::new(args.api.host.clone(), args.api.token.clone())?;
            let ctx = AccContext::new(client);
            let tf = Terraform::new(
                args.terraform,
                ProviderConfig {
                    source: args.provider_source,
                },
                ProviderEnv {
                    host: args.api.host,
                    token: args.api.token,
                },
            )?;

            let case = scenario.test_case();
            let report = case.run(&ctx, &tf).await?;
            println!("{}", output::render_report(&report));

            if !report.is_success() {
                let failures = report
                    .failures()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(Error::CaseFailed {
                    name: report.name,
                    failures,
                }
                .into());
            }
            tracing::info!(case = %report.name, "test case passed");
        }
        Command::Render(args) => {
            let import = args.import.as_deref().map(id::decode).transpose()?;
            let scenario = scenarios::get_scenario(&args.scenario)?;
            for (i, step) in scenario.test_case().steps.iter().enumerate() {
                println!("# step {}\n{}", i + 1, step.config.render());
            }
            if let Some(id) = import {
                println!("{}", import_block(NODE_DEPLOYMENT_ADDRESS, &id.to_string()));
            }
        }
        Command::ParseId(args) => {
            let id = id::decode(&args.id)?;
            println!("project_id:         {}", id.project_id);
            println!("datacenter:         {}", id.datacenter);
            println!("cluster_id:         {}", id.cluster_id);
            println!("node_deployment_id: {}", id.node_deployment_id);
        }
        Command::GetNodeDeployment(args) => {
            let id = id::decode(&args.id)?;
            let client = KubermaticClient::new(args.api.host, args.api.token)?;
            let nd = client.get_node_deployment(&id).await?;
            println!("{}", output::render_node_deployment(&nd));
        }
        Command::ListNodeDeployments(args) => {
            let cluster: ClusterId = args.cluster_id.parse()?;
            let client = KubermaticClient::new(args.api.host, args.api.token)?;
            let info = client.get_cluster(&cluster).await?;
            let version = info
                .spec
                .as_ref()
                .and_then(|s| s.version.as_deref())
                .unwrap_or("-");
            println!("cluster {} ({}, version {})", info.name, cluster, version);
            let nds = client.list_node_deployments(&cluster).await?;
            println!("{}", output::render_node_deployments(&nds));
        }
        Command::ScaleNodeDeployment(args) => {
            let id = id::decode(&args.id)?;
            let client = KubermaticClient::new(args.api.host, args.api.token)?;
            let patch = serde_json::json!({"spec": {"replicas": args.replicas}});
            let nd = client.patch_node_deployment(&id, &patch).await?;
            println!("{}", output::render_node_deployment(&nd));
        }
        Command::DeleteNodeDeployment(args) => {
            let id = id::decode(&args.id)?;
            let client = KubermaticClient::new(args.api.host, args.api.token)?;
            match sweep::sweep_node_deployment(&client, &id).await? {
                Swept::AlreadyGone => println!("node deployment {id} does not exist"),
                _ => println!("node deployment {id} deleted"),
            }
        }
        Command::SweepProject(args) => {
            let client = KubermaticClient::new(args.api.host, args.api.token)?;
            match sweep::sweep_project(&client, &args.project_id).await? {
                Swept::Deleted => println!("project {} deleted", args.project_id),
                Swept::AlreadyGone => println!("project {} does not exist", args.project_id),
                Swept::Skipped(name) => {
                    bail!("project {} ({name}) was not created by an acceptance run, refusing to delete", args.project_id)
                }
            }
        }
    }

    Ok(())
}
