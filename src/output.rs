use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::acctest::{CaseReport, Outcome};
use crate::api::NodeDeployment;

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "STEP")]
    step: String,
    #[tabled(rename = "RESULT")]
    result: &'static str,
    #[tabled(rename = "DETAIL")]
    detail: String,
}

pub fn render_report(report: &CaseReport) -> String {
    let rows = report.steps.iter().map(|s| {
        let (result, detail) = match &s.outcome {
            Outcome::Passed => ("PASS", String::new()),
            Outcome::Failed(e) => ("FAIL", e.to_string()),
            Outcome::Skipped => ("SKIP", String::new()),
        };
        StepRow {
            step: s.label.clone(),
            result,
            detail,
        }
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!("{}\n{}", report.name, table)
}

fn cloud_name(nd: &NodeDeployment) -> &'static str {
    match nd.cloud() {
        Some(c) if c.openstack.is_some() => "openstack",
        Some(c) if c.azure.is_some() => "azure",
        Some(c) if c.aws.is_some() => "aws",
        _ => "-",
    }
}

fn replicas(nd: &NodeDeployment) -> String {
    nd.spec
        .as_ref()
        .and_then(|s| s.replicas)
        .map_or_else(|| "-".to_string(), |r| r.to_string())
}

fn kubelet(nd: &NodeDeployment) -> String {
    nd.template()
        .and_then(|t| t.versions.as_ref())
        .map_or_else(|| "-".to_string(), |v| v.kubelet.clone())
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "REPLICAS")]
    replicas: String,
    #[tabled(rename = "KUBELET")]
    kubelet: String,
    #[tabled(rename = "CLOUD")]
    cloud: &'static str,
}

pub fn render_node_deployments(nds: &[NodeDeployment]) -> String {
    let rows = nds.iter().map(|nd| ListRow {
        id: nd.id.clone(),
        name: nd.name.clone(),
        replicas: replicas(nd),
        kubelet: kubelet(nd),
        cloud: cloud_name(nd),
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    field: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

/// Summary of the fields the acceptance checks look at.
pub fn render_node_deployment(nd: &NodeDeployment) -> String {
    let template = nd.template();

    let rows = vec![
        FieldRow {
            field: "id",
            value: nd.id.clone(),
        },
        FieldRow {
            field: "name",
            value: nd.name.clone(),
        },
        FieldRow {
            field: "replicas",
            value: replicas(nd),
        },
        FieldRow {
            field: "cloud",
            value: cloud_name(nd).to_string(),
        },
        FieldRow {
            field: "kubelet",
            value: kubelet(nd),
        },
        FieldRow {
            field: "dist_upgrade_on_boot",
            value: template
                .and_then(|t| t.operating_system.as_ref())
                .and_then(|os| os.ubuntu.as_ref())
                .map_or_else(|| "-".to_string(), |u| u.dist_upgrade_on_boot.to_string()),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}
