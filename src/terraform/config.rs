//! Typed Terraform configuration for the acceptance resources.
//!
//! Values are always written through [`HclWriter`], which quotes and escapes
//! strings, so no user-supplied value can break out of its attribute.

use std::collections::BTreeMap;

pub const PROJECT_ADDRESS: &str = "kubermatic_project.acctest_project";
pub const CLUSTER_ADDRESS: &str = "kubermatic_cluster.acctest_cluster";
pub const NODE_DEPLOYMENT_ADDRESS: &str = "kubermatic_node_deployment.acctest_nd";

pub const DEFAULT_PROVIDER_SOURCE: &str = "kubermatic/kubermatic";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Unquoted expression such as `kubermatic_project.acctest_project.id`.
    Ref(String),
    Map(BTreeMap<String, String>),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Escapes a string for use inside a quoted HCL template.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Default)]
pub struct HclWriter {
    out: String,
    depth: usize,
}

impl HclWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    pub fn open(&mut self, header: &str) -> &mut Self {
        self.indent();
        self.out.push_str(&format!("{header} {{\n"));
        self.depth += 1;
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("}\n");
        self
    }

    pub fn empty_block(&mut self, name: &str) -> &mut Self {
        self.indent();
        self.out.push_str(&format!("{name} {{}}\n"));
        self
    }

    pub fn attr(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let rendered = match value.into() {
            Value::Map(entries) => return self.map(key, &entries),
            Value::Str(s) => quote(&s),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Ref(r) => r,
        };
        self.indent();
        self.out.push_str(&format!("{key} = {rendered}\n"));
        self
    }

    /// Empty maps are omitted entirely.
    fn map(&mut self, key: &str, entries: &BTreeMap<String, String>) -> &mut Self {
        if entries.is_empty() {
            return self;
        }
        self.indent();
        self.out.push_str(&format!("{key} = {{\n"));
        for (k, v) in entries {
            self.indent();
            self.out.push_str(&format!("  {} = {}\n", quote(k), quote(v)));
        }
        self.indent();
        self.out.push_str("}\n");
        self
    }

    pub fn opt_attr(&mut self, key: &str, value: Option<impl Into<Value>>) -> &mut Self {
        if let Some(v) = value {
            self.attr(key, v);
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub source: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_PROVIDER_SOURCE.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Provider credentials come from `KUBERMATIC_HOST`/`KUBERMATIC_TOKEN`
    /// in the environment, so the provider block itself stays empty.
    pub fn render(&self) -> String {
        let mut w = HclWriter::new();
        w.open("terraform")
            .open("required_providers")
            .open("kubermatic =")
            .attr("source", self.source.as_str())
            .close()
            .close()
            .close()
            .blank()
            .empty_block("provider \"kubermatic\"");
        w.finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterCloud {
    Openstack {
        tenant: String,
        username: String,
        password: String,
        floating_ip_pool: String,
    },
    Azure {
        client_id: String,
        client_secret: String,
        tenant_id: String,
        subscription_id: String,
    },
    Aws {
        access_key_id: String,
        access_key_secret: String,
        vpc_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub name: String,
    pub dc_name: String,
    pub version: String,
    pub labels: BTreeMap<String, String>,
    pub cloud: ClusterCloud,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeCloud {
    Openstack {
        flavor: String,
        image: String,
        use_floating_ip: Option<bool>,
        disk_size: Option<i64>,
    },
    Azure {
        size: String,
    },
    Aws {
        instance_type: String,
        disk_size: i64,
        volume_type: String,
        subnet_id: String,
        availability_zone: String,
        assign_public_ip: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDeploymentConfig {
    pub name: String,
    pub replicas: i64,
    pub labels: BTreeMap<String, String>,
    pub cloud: NodeCloud,
    /// `None` renders an empty `ubuntu {}` block.
    pub dist_upgrade_on_boot: Option<bool>,
    pub kubelet: String,
}

/// One complete acceptance configuration: a project, a cluster in it and a
/// node deployment in the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct AccConfig {
    pub project: ProjectConfig,
    pub cluster: ClusterConfig,
    pub node_deployment: NodeDeploymentConfig,
}

impl AccConfig {
    pub fn render(&self) -> String {
        let mut w = HclWriter::new();
        self.project.write(&mut w);
        w.blank();
        self.cluster.write(&mut w);
        w.blank();
        self.node_deployment.write(&mut w);
        w.finish()
    }
}

impl ProjectConfig {
    fn write(&self, w: &mut HclWriter) {
        w.open("resource \"kubermatic_project\" \"acctest_project\"")
            .attr("name", self.name.as_str())
            .attr("labels", Value::Map(self.labels.clone()))
            .close();
    }
}

impl ClusterConfig {
    fn write(&self, w: &mut HclWriter) {
        w.open("resource \"kubermatic_cluster\" \"acctest_cluster\"")
            .attr("name", self.name.as_str())
            .attr("dc_name", self.dc_name.as_str())
            .attr("project_id", Value::Ref(format!("{PROJECT_ADDRESS}.id")))
            .attr("labels", Value::Map(self.labels.clone()))
            .open("spec")
            .attr("version", self.version.as_str())
            .open("cloud");

        match &self.cloud {
            ClusterCloud::Openstack {
                tenant,
                username,
                password,
                floating_ip_pool,
            } => {
                w.open("openstack")
                    .attr("tenant", tenant.as_str())
                    .attr("username", username.as_str())
                    .attr("password", password.as_str())
                    .attr("floating_ip_pool", floating_ip_pool.as_str())
                    .close();
            }
            ClusterCloud::Azure {
                client_id,
                client_secret,
                tenant_id,
                subscription_id,
            } => {
                w.open("azure")
                    .attr("client_id", client_id.as_str())
                    .attr("client_secret", client_secret.as_str())
                    .attr("tenant_id", tenant_id.as_str())
                    .attr("subscription_id", subscription_id.as_str())
                    .close();
            }
            ClusterCloud::Aws {
                access_key_id,
                access_key_secret,
                vpc_id,
            } => {
                w.open("aws")
                    .attr("access_key_id", access_key_id.as_str())
                    .attr("access_key_secret", access_key_secret.as_str())
                    .attr("vpc_id", vpc_id.as_str())
                    .close();
            }
        }

        w.close().close().close();
    }
}

impl NodeDeploymentConfig {
    fn write(&self, w: &mut HclWriter) {
        w.open("resource \"kubermatic_node_deployment\" \"acctest_nd\"")
            .attr("cluster_id", Value::Ref(format!("{CLUSTER_ADDRESS}.id")))
            .attr("name", self.name.as_str())
            .open("spec")
            .attr("replicas", self.replicas)
            .open("template")
            .attr("labels", Value::Map(self.labels.clone()))
            .open("cloud");

        match &self.cloud {
            NodeCloud::Openstack {
                flavor,
                image,
                use_floating_ip,
                disk_size,
            } => {
                w.open("openstack")
                    .attr("flavor", flavor.as_str())
                    .attr("image", image.as_str())
                    .opt_attr("use_floating_ip", *use_floating_ip)
                    .opt_attr("disk_size", *disk_size)
                    .close();
            }
            NodeCloud::Azure { size } => {
                w.open("azure").attr("size", size.as_str()).close();
            }
            NodeCloud::Aws {
                instance_type,
                disk_size,
                volume_type,
                subnet_id,
                availability_zone,
                assign_public_ip,
            } => {
                w.open("aws")
                    .attr("instance_type", instance_type.as_str())
                    .attr("disk_size", *disk_size)
                    .attr("volume_type", volume_type.as_str())
                    .attr("subnet_id", subnet_id.as_str())
                    .attr("availability_zone", availability_zone.as_str())
                    .attr("assign_public_ip", *assign_public_ip)
                    .close();
            }
        }
        w.close();

        w.open("operating_system");
        match self.dist_upgrade_on_boot {
            Some(upgrade) => {
                w.open("ubuntu")
                    .attr("dist_upgrade_on_boot", upgrade)
                    .close();
            }
            None => {
                w.empty_block("ubuntu");
            }
        }
        w.close();

        w.open("versions")
            .attr("kubelet", self.kubelet.as_str())
            .close();

        w.close().close().close();
    }
}

/// Renders an `import` block adopting an existing resource under `address`.
pub fn import_block(address: &str, id: &str) -> String {
    let mut w = HclWriter::new();
    w.open("import")
        .attr("to", Value::Ref(address.to_string()))
        .attr("id", id)
        .close();
    w.finish()
}
