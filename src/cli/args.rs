use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

use kubermatic_acc::scenarios::SCENARIOS;
use kubermatic_acc::terraform::config::DEFAULT_PROVIDER_SOURCE;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an acceptance scenario end to end (requires TF_ACC)
    Run(RunArgs),
    /// Print the configuration of each step of a scenario
    Render(RenderArgs),
    /// Split a node deployment ID into its segments
    ParseId(ParseIdArgs),
    /// Fetch a node deployment by its composite ID
    GetNodeDeployment(NodeDeploymentArgs),
    /// List the node deployments of a cluster (project:datacenter:cluster)
    ListNodeDeployments(ClusterArgs),
    /// Set the replica count of a node deployment
    ScaleNodeDeployment(ScaleArgs),
    /// Delete a node deployment; succeeds if it is already gone
    DeleteNodeDeployment(NodeDeploymentArgs),
    /// Delete a project left behind by an interrupted run
    SweepProject(SweepArgs),
}

#[derive(clap::Args, Debug)]
pub struct ApiArgs {
    #[arg(long, env = "KUBERMATIC_HOST")]
    pub host: String,

    #[arg(long, env = "KUBERMATIC_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[arg(value_parser = PossibleValuesParser::new(SCENARIOS.iter().copied()))]
    pub scenario: String,

    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(long, env = "TF_ACC_TERRAFORM_PATH", default_value = "terraform")]
    pub terraform: String,

    #[arg(long, env = "KUBERMATIC_PROVIDER_SOURCE", default_value = DEFAULT_PROVIDER_SOURCE)]
    pub provider_source: String,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    #[arg(value_parser = PossibleValuesParser::new(SCENARIOS.iter().copied()))]
    pub scenario: String,

    /// Adopt an existing node deployment instead of creating one
    #[arg(long, value_name = "ID")]
    pub import: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ParseIdArgs {
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct NodeDeploymentArgs {
    pub id: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(clap::Args, Debug)]
pub struct ClusterArgs {
    pub cluster_id: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(clap::Args, Debug)]
pub struct ScaleArgs {
    pub id: String,

    #[arg(long)]
    pub replicas: i32,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(clap::Args, Debug)]
pub struct SweepArgs {
    pub project_id: String,

    #[command(flatten)]
    pub api: ApiArgs,
}
