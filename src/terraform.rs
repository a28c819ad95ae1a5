pub mod config;
pub mod runner;
pub mod state;

pub use config::{AccConfig, ProviderConfig};
pub use runner::{ProviderEnv, Terraform, TerraformError};
pub use state::{ResourceState, State, StateError};
