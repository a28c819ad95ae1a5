use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use super::config::ProviderConfig;
use super::state::{State, StateError};

const STATE_FILE: &str = "terraform.tfstate";
const CONFIG_FILE: &str = "main.tf";
const PROVIDER_FILE: &str = "provider.tf";

#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("failed to prepare working directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("terraform {command} exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

/// Settings forwarded to the provider plugin through the environment.
#[derive(Clone)]
pub struct ProviderEnv {
    pub host: String,
    pub token: String,
}

impl std::fmt::Debug for ProviderEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEnv")
            .field("host", &self.host)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Drives the `terraform` binary inside a private working directory that is
/// removed on drop.
#[derive(Debug)]
pub struct Terraform {
    binary: PathBuf,
    workdir: TempDir,
    provider: ProviderConfig,
    env: ProviderEnv,
}

impl Terraform {
    pub fn new(
        binary: impl Into<PathBuf>,
        provider: ProviderConfig,
        env: ProviderEnv,
    ) -> Result<Self, TerraformError> {
        let workdir = tempfile::Builder::new().prefix("tf-acc-").tempdir()?;
        Ok(Self {
            binary: binary.into(),
            workdir,
            provider,
            env,
        })
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    pub async fn init(&self) -> Result<(), TerraformError> {
        tokio::fs::write(self.workdir().join(PROVIDER_FILE), self.provider.render()).await?;
        self.run(&["init", "-input=false", "-no-color"]).await?;
        Ok(())
    }

    pub async fn apply(&self, config: &str) -> Result<State, TerraformError> {
        tokio::fs::write(self.workdir().join(CONFIG_FILE), config).await?;
        self.run(&["apply", "-auto-approve", "-input=false", "-no-color"])
            .await?;
        self.state().await
    }

    pub async fn destroy(&self) -> Result<State, TerraformError> {
        self.run(&["destroy", "-auto-approve", "-input=false", "-no-color"])
            .await?;
        self.state().await
    }

    pub async fn state(&self) -> Result<State, TerraformError> {
        let state = State::load(&self.workdir().join(STATE_FILE)).await?;
        tracing::debug!(resources = ?state.addresses().collect::<Vec<_>>(), "state loaded");
        Ok(state)
    }

    async fn run(&self, args: &[&str]) -> Result<String, TerraformError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        tracing::info!(%command, workdir = %self.workdir().display(), "running terraform");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(self.workdir())
            .env("KUBERMATIC_HOST", &self.env.host)
            .env("KUBERMATIC_TOKEN", &self.env.token)
            .env("TF_IN_AUTOMATION", "1");
        if let Some(cache) = plugin_cache_dir() {
            match tokio::fs::create_dir_all(&cache).await {
                Ok(()) => {
                    cmd.env("TF_PLUGIN_CACHE_DIR", cache);
                }
                Err(e) => {
                    tracing::warn!(cache = %cache.display(), error = %e, "plugin cache unavailable, providers will be downloaded");
                }
            }
        }

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(%command, status = %output.status, "terraform failed");
            return Err(TerraformError::Command {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(%command, "terraform finished");
        Ok(stdout)
    }
}

/// Shared provider download cache, so each test case does not fetch plugins
/// again.
pub fn plugin_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("kubermatic-acc").join("plugin-cache"))
}
