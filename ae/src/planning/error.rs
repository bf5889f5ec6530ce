//! Planning error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while assessing or decomposing an objective
#[derive(Debug, Error)]
pub enum PlanningError {
    /// Objective text was empty; the gate re-asks
    #[error("The objective has not been entered.")]
    EmptyObjective,

    /// Classifier reply did not start with a digit from the tag table
    #[error("response is not a number: {response:?} for {task}")]
    Parse { task: String, response: String },

    /// Missing credential or unusable settings, raised before any prompt is sent
    #[error("Configuration error: {0}")]
    Config(String),

    /// User interrupted while being asked for input
    #[error("Cancelled by user")]
    Cancelled,

    /// Oracle failure after transport retries
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Template missing or failed to render
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Subdivision hit the configured pass bound before reaching a fixpoint
    #[error("Subdivision did not converge after {passes} passes ({pending} tasks still need breakdown)")]
    PassLimitExceeded { passes: u32, pending: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlanningError {
    /// Fatal errors are reported and end the session after saving the log
    ///
    /// Cancellation and a blank objective are not failures of the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::EmptyObjective)
    }

    /// Wrap a template failure
    pub fn prompt(err: eyre::Report) -> Self {
        Self::Prompt(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_task_and_reply() {
        let err = PlanningError::Parse {
            task: "- print greeting".to_string(),
            response: "7".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"7\""));
        assert!(msg.contains("- print greeting"));
    }

    #[test]
    fn test_error_classes() {
        assert!(!PlanningError::EmptyObjective.is_fatal());
        assert!(!PlanningError::Cancelled.is_fatal());
        assert!(PlanningError::Config("no key".to_string()).is_fatal());
        assert!(
            PlanningError::PassLimitExceeded { passes: 3, pending: 1 }.is_fatal()
        );
    }

    #[test]
    fn test_llm_error_converts() {
        let err: PlanningError = LlmError::BadResponse("empty".to_string()).into();
        assert!(matches!(err, PlanningError::Llm(_)));
    }
}
