use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] crate::id::IdError),

    #[error(transparent)]
    Api(#[from] crate::api::ApiError),

    #[error(transparent)]
    Terraform(#[from] crate::terraform::TerraformError),

    #[error(transparent)]
    Scenario(#[from] crate::scenarios::ScenarioError),

    #[error("test case {name} failed: {failures}")]
    CaseFailed { name: String, failures: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
