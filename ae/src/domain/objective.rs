//! Objective/context pair supplied by the user

use tracing::debug;

use crate::planning::PlanningError;

/// The user's goal plus its free-text constraints
///
/// Fields are private and `new` is the only constructor, so an objective is
/// never blank and cannot change after the feasibility gate approved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    objective: String,
    context: String,
}

impl Objective {
    /// Build an objective; whitespace-only objective text is rejected
    pub fn new(objective: impl Into<String>, context: impl Into<String>) -> Result<Self, PlanningError> {
        let objective = objective.into();
        let context = context.into();
        debug!(%objective, context_len = context.len(), "Objective::new: called");
        if objective.trim().is_empty() {
            debug!("Objective::new: empty objective");
            return Err(PlanningError::EmptyObjective);
        }
        Ok(Self { objective, context })
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_accepts_empty_context() {
        let obj = Objective::new("Write a greeting function", "").unwrap();
        assert_eq!(obj.objective(), "Write a greeting function");
        assert_eq!(obj.context(), "");
    }

    #[test]
    fn test_objective_rejects_blank() {
        assert!(matches!(Objective::new("", "ctx"), Err(PlanningError::EmptyObjective)));
        assert!(matches!(Objective::new("  \n\t", "ctx"), Err(PlanningError::EmptyObjective)));
    }

    #[test]
    fn test_objective_keeps_text_verbatim() {
        let obj = Objective::new("  Make Tetris ", "no sound").unwrap();
        assert_eq!(obj.objective(), "  Make Tetris ");
        assert_eq!(obj.context(), "no sound");
    }
}
