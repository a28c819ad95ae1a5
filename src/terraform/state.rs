//! Terraform state reader.
//!
//! Parses tfstate v4 files and exposes each managed resource's attributes in
//! flatmap form (`spec.0.template.0.versions.0.kubelet`, `labels.%`, ...),
//! the addressing used by attribute checks.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const SUPPORTED_VERSION: u64 = 4;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse state: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported state version {0}, expected 4")]
    UnsupportedVersion(u64),
}

#[derive(Debug, Deserialize)]
struct RawState {
    version: u64,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    mode: String,
    #[serde(rename = "type")]
    type_: String,
    name: String,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// Primary instance of one managed resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    resources: BTreeMap<String, ResourceState>,
}

impl State {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let raw: RawState = serde_json::from_str(json)?;
        if raw.version != SUPPORTED_VERSION {
            return Err(StateError::UnsupportedVersion(raw.version));
        }

        let resources = raw
            .resources
            .into_iter()
            .filter(|r| r.mode == "managed")
            .filter_map(|r| {
                let address = format!("{}.{}", r.type_, r.name);
                let instance = r.instances.into_iter().next()?;
                Some((address, ResourceState::from_attributes(instance.attributes)))
            })
            .collect();

        Ok(Self { resources })
    }

    /// A missing state file means nothing has been applied yet.
    pub async fn load(path: &Path) -> Result<Self, StateError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a resource by address, e.g. `kubermatic_node_deployment.acctest_nd`.
    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}

impl ResourceState {
    fn from_attributes(attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut flat = BTreeMap::new();
        for (key, value) in &attributes {
            flatten(key, value, &mut flat);
        }
        let id = flat.get("id").cloned().unwrap_or_default();
        Self {
            id,
            attributes: flat,
        }
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    use serde_json::Value;

    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{prefix}.#"), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{prefix}.{i}"), item, out);
            }
        }
        Value::Object(entries) => {
            out.insert(format!("{prefix}.%"), entries.len().to_string());
            for (k, v) in entries {
                flatten(&format!("{prefix}.{k}"), v, out);
            }
        }
    }
}
