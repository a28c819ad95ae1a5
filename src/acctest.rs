//! Acceptance-test harness: applies configurations through Terraform and
//! checks the resulting state against the Kubermatic API.

pub mod check;
pub mod env;
pub mod sweep;

pub use check::{BoxCheck, Check, CheckError, Snapshot};
pub use env::PreCheckError;

use crate::api::KubermaticClient;
use crate::terraform::{AccConfig, Terraform, TerraformError};

pub const TEST_NAME_PREFIX: &str = "tf-acc-test-";

/// Everything a check may need, handed to it explicitly. A fresh context is
/// built for every test case.
#[derive(Debug, Clone)]
pub struct AccContext {
    pub client: KubermaticClient,
}

impl AccContext {
    pub fn new(client: KubermaticClient) -> Self {
        Self { client }
    }
}

pub fn random_test_name() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{TEST_NAME_PREFIX}{}", &suffix[..8])
}

pub struct TestStep {
    pub config: AccConfig,
    pub check: BoxCheck,
}

pub struct TestCase {
    pub name: String,
    pub steps: Vec<TestStep>,
    pub check_destroy: BoxCheck,
}

#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(CheckError),
    /// Not run because an earlier step failed.
    Skipped,
}

impl Outcome {
    fn from_result(result: Result<(), CheckError>) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct StepReport {
    pub label: String,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub steps: Vec<StepReport>,
}

impl CaseReport {
    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|s| s.outcome.is_failed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckError> {
        self.steps.iter().filter_map(|s| match &s.outcome {
            Outcome::Failed(e) => Some(e),
            _ => None,
        })
    }
}

impl TestCase {
    /// Applies each step in order and runs its checks. The first failing step
    /// ends the case; the infrastructure is destroyed either way and the
    /// destroy check runs last. A failed destroy is reported as the outcome
    /// of the `destroy` step. A failed apply is returned as the error once
    /// destroy has run.
    pub async fn run(&self, ctx: &AccContext, tf: &Terraform) -> Result<CaseReport, TerraformError> {
        tracing::info!(case = %self.name, steps = self.steps.len(), "starting test case");
        tf.init().await?;

        let mut reports = Vec::with_capacity(self.steps.len() + 1);
        let mut failed = false;
        let mut apply_error = None;

        for (i, step) in self.steps.iter().enumerate() {
            let label = format!("step {}", i + 1);
            if failed {
                reports.push(StepReport {
                    label,
                    outcome: Outcome::Skipped,
                });
                continue;
            }

            let state = match tf.apply(&step.config.render()).await {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!(case = %self.name, %label, error = %e, "apply failed");
                    failed = true;
                    apply_error = Some(e);
                    reports.push(StepReport {
                        label,
                        outcome: Outcome::Skipped,
                    });
                    continue;
                }
            };

            let outcome = Outcome::from_result(step.check.check(ctx, &state).await);
            if let Outcome::Failed(e) = &outcome {
                tracing::error!(case = %self.name, %label, error = %e, "check failed");
                failed = true;
            } else {
                tracing::info!(case = %self.name, %label, "step passed");
            }
            reports.push(StepReport { label, outcome });
        }

        let destroy_outcome = match tf.destroy().await {
            Ok(destroyed) => Outcome::from_result(self.check_destroy.check(ctx, &destroyed).await),
            Err(e) => {
                tracing::error!(case = %self.name, error = %e, "destroy failed, resources may be left behind");
                Outcome::Failed(CheckError::Destroy(e))
            }
        };
        reports.push(StepReport {
            label: "destroy".to_string(),
            outcome: destroy_outcome,
        });

        if let Some(e) = apply_error {
            return Err(e);
        }

        Ok(CaseReport {
            name: self.name.clone(),
            steps: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_test_name_shape() {
        let name = random_test_name();
        assert!(name.starts_with("tf-acc-test-"));
        assert_eq!(name.len(), TEST_NAME_PREFIX.len() + 8);
        assert!(name[TEST_NAME_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_random_test_names_differ() {
        assert_ne!(random_test_name(), random_test_name());
    }

    #[test]
    fn test_case_report_success() {
        let report = CaseReport {
            name: "x".to_string(),
            steps: vec![
                StepReport {
                    label: "step 1".to_string(),
                    outcome: Outcome::Passed,
                },
                StepReport {
                    label: "destroy".to_string(),
                    outcome: Outcome::Passed,
                },
            ],
        };
        assert!(report.is_success());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_case_report_failure() {
        let report = CaseReport {
            name: "x".to_string(),
            steps: vec![
                StepReport {
                    label: "step 1".to_string(),
                    outcome: Outcome::Failed(CheckError::NoRecord),
                },
                StepReport {
                    label: "step 2".to_string(),
                    outcome: Outcome::Skipped,
                },
            ],
        };
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
    }
}
