//! Stage execution
//!
//! A stage is a named unit of work. Stages run strictly in order and the
//! pipeline is fail-fast: the first stage to fail aborts the run with no
//! retries and no rollback of partially modified directories.

use tracing::info;

use crate::error::CoreError;

/// Outcome of a single pipeline stage
pub type StageResult = Result<(), CoreError>;

/// Run one named stage, wrapping any failure with the stage name
pub fn run_stage<F>(name: &'static str, f: F) -> StageResult
where
    F: FnOnce() -> StageResult,
{
    info!(stage = name, "running stage");
    f().map_err(|e| CoreError::Stage {
        stage: name,
        source: Box::new(e),
    })
}

/// Record a skipped stage; succeeds immediately with no side effects
pub fn skip_stage(name: &'static str) -> StageResult {
    info!(stage = name, "stage skipped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stage_names_failure() {
        let result = run_stage("configure", || {
            Err(CoreError::CommandFailed {
                program: "./configure".to_string(),
                code: Some(1),
            })
        });
        match result.unwrap_err() {
            CoreError::Stage { stage, source } => {
                assert_eq!(stage, "configure");
                assert!(matches!(*source, CoreError::CommandFailed { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_skip_stage_succeeds() {
        assert!(skip_stage("fetch-source").is_ok());
    }
}
