//! Feasibility gate
//!
//! Loops over objective and context input until the oracle says the objective
//! is achievable. The reply is feasible iff it contains the literal "Yes";
//! anything else, garbled output included, is a rejection.

use std::sync::Arc;

use tracing::{debug, info};

use super::{InputRequest, PlanEvent, PlanningError, SessionIo};
use crate::agent::BotAgent;
use crate::config::CapabilitiesConfig;
use crate::documents::DocumentReader;
use crate::domain::Objective;
use crate::llm::Message;
use crate::prompts::{PromptContext, PromptLoader};

/// Outcome of one assessment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Feasible,
    /// `reason` is the oracle's justification, verbatim
    Infeasible { reason: String },
}

impl Assessment {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible)
    }
}

/// Where `determine` currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    AwaitingObjective,
    AwaitingContext { objective: String },
    Assessing(Objective),
    Accepted(Objective),
}

/// Asks the oracle whether an objective is achievable
pub struct FeasibilityGate {
    agent: BotAgent,
    prompts: Arc<PromptLoader>,
    documents: DocumentReader,
    capabilities: CapabilitiesConfig,
}

impl FeasibilityGate {
    pub fn new(
        agent: BotAgent,
        prompts: Arc<PromptLoader>,
        documents: DocumentReader,
        capabilities: CapabilitiesConfig,
    ) -> Self {
        debug!(file = %capabilities.file, "FeasibilityGate::new: called");
        Self {
            agent,
            prompts,
            documents,
            capabilities,
        }
    }

    /// Judge one objective
    ///
    /// On rejection, a follow-up on the same conversation asks why, and the
    /// answer is reported once as `PlanEvent::Rejected`.
    pub async fn assess(&self, objective: &Objective, io: &mut dyn SessionIo) -> Result<Assessment, PlanningError> {
        debug!(objective = %objective.objective(), "FeasibilityGate::assess: called");
        let abilities = self.documents.capabilities(&self.capabilities);
        let ctx = PromptContext::for_objective(objective).with_abilities(abilities);

        let mut agent = self.agent.spawn();
        let prompt = self.prompts.render("feasibility", &ctx).map_err(PlanningError::prompt)?;
        let response = agent.ask_with_memory(Message::system(prompt)).await?;
        io.notify(PlanEvent::OracleReturned);

        if response.contains("Yes") {
            info!(objective = %objective.objective(), "Objective judged feasible");
            return Ok(Assessment::Feasible);
        }

        debug!(%response, "FeasibilityGate::assess: not feasible, asking why");
        let prompt = self
            .prompts
            .render("feasibility-reason", &ctx)
            .map_err(PlanningError::prompt)?;
        let reason = agent.ask_with_memory(Message::system(prompt)).await?;
        io.notify(PlanEvent::OracleReturned);

        info!(objective = %objective.objective(), "Objective judged infeasible");
        io.notify(PlanEvent::Rejected { reason: reason.clone() });
        Ok(Assessment::Infeasible { reason })
    }

    /// Ask for objective and context until an objective is accepted
    ///
    /// There is no cap on rejections. Cancellation while waiting for input
    /// ends the loop with `PlanningError::Cancelled`.
    pub async fn determine(&self, io: &mut dyn SessionIo) -> Result<Objective, PlanningError> {
        debug!("FeasibilityGate::determine: called");
        let mut state = GateState::AwaitingObjective;
        loop {
            state = match state {
                GateState::AwaitingObjective => {
                    let objective = io.request_input(InputRequest::Objective).await?;
                    if objective.trim().is_empty() {
                        debug!("FeasibilityGate::determine: empty objective");
                        io.notify(PlanEvent::InvalidObjective);
                        GateState::AwaitingObjective
                    } else {
                        GateState::AwaitingContext { objective }
                    }
                }
                GateState::AwaitingContext { objective } => {
                    let context = io.request_input(InputRequest::Context).await?;
                    GateState::Assessing(Objective::new(objective, context)?)
                }
                GateState::Assessing(objective) => {
                    io.notify(PlanEvent::AssessingFeasibility);
                    if self.assess(&objective, io).await?.is_feasible() {
                        io.notify(PlanEvent::Accepted);
                        GateState::Accepted(objective)
                    } else {
                        GateState::AwaitingObjective
                    }
                }
                GateState::Accepted(objective) => return Ok(objective),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::llm::client::mock::MockLlmClient;
    use crate::planning::events::recording::RecordingIo;
    use tempfile::tempdir;

    fn gate(mock: &Arc<MockLlmClient>, root: &std::path::Path) -> FeasibilityGate {
        FeasibilityGate::new(
            BotAgent::new(mock.clone(), "test-model", 256),
            Arc::new(PromptLoader::embedded_only()),
            DocumentReader::new(root),
            CapabilitiesConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_yes_is_feasible() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["Yes."]));
        let mut io = RecordingIo::default();
        let objective = Objective::new("Write a greeting function", "").unwrap();

        let result = gate(&mock, dir.path()).assess(&objective, &mut io).await.unwrap();

        assert_eq!(result, Assessment::Feasible);
        assert_eq!(mock.call_count(), 1);
        assert!(io.rejections().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_reason_shown_verbatim() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&[
            "No, because it requires hardware.",
            "It requires hardware.",
        ]));
        let mut io = RecordingIo::default();
        let objective = Objective::new("Build a robot arm", "").unwrap();

        let result = gate(&mock, dir.path()).assess(&objective, &mut io).await.unwrap();

        assert_eq!(
            result,
            Assessment::Infeasible {
                reason: "It requires hardware.".to_string()
            }
        );
        assert_eq!(io.rejections(), vec!["It requires hardware."]);

        let follow_up = &mock.requests()[1].messages;
        assert_eq!(follow_up.len(), 3);
        assert_eq!(follow_up[1].role, Role::Assistant);
        assert_eq!(follow_up[1].content, "No, because it requires hardware.");
    }

    #[tokio::test]
    async fn test_lowercase_yes_is_not_feasible() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["yes", "unclear"]));
        let mut io = RecordingIo::default();
        let objective = Objective::new("x", "").unwrap();

        let result = gate(&mock, dir.path()).assess(&objective, &mut io).await.unwrap();
        assert!(!result.is_feasible());
    }

    #[tokio::test]
    async fn test_capability_document_is_interpolated() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("documents")).unwrap();
        std::fs::write(dir.path().join("documents/abilities.txt"), "- can bake bread").unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["Yes"]));
        let mut io = RecordingIo::default();
        let objective = Objective::new("Bake bread", "").unwrap();

        gate(&mock, dir.path()).assess(&objective, &mut io).await.unwrap();

        let prompt = &mock.requests()[0].messages[0];
        assert_eq!(prompt.role, Role::System);
        assert!(prompt.content.contains("- can bake bread"));
        assert!(prompt.content.contains("Objective: Bake bread"));
    }

    #[tokio::test]
    async fn test_determine_no_then_yes() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["No", "Needs hardware.", "Yes"]));
        let mut io = RecordingIo::with_inputs(&["Build a robot", "", "Write a greeting function", "Python"]);

        let objective = gate(&mock, dir.path()).determine(&mut io).await.unwrap();

        assert_eq!(objective.objective(), "Write a greeting function");
        assert_eq!(objective.context(), "Python");
        assert_eq!(io.rejections(), vec!["Needs hardware."]);
        assert_eq!(io.count(&PlanEvent::Accepted), 1);
        assert_eq!(io.count(&PlanEvent::AssessingFeasibility), 2);
        assert_eq!(
            io.requests,
            vec![
                InputRequest::Objective,
                InputRequest::Context,
                InputRequest::Objective,
                InputRequest::Context,
            ]
        );
    }

    #[tokio::test]
    async fn test_determine_reasks_on_empty_objective() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["Yes"]));
        let mut io = RecordingIo::with_inputs(&["   ", "Write a greeting function", ""]);

        let objective = gate(&mock, dir.path()).determine(&mut io).await.unwrap();

        assert_eq!(objective.objective(), "Write a greeting function");
        assert_eq!(io.count(&PlanEvent::InvalidObjective), 1);
    }

    #[tokio::test]
    async fn test_determine_propagates_cancellation() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let mut io = RecordingIo::with_inputs(&["Write a greeting function"]);

        let result = gate(&mock, dir.path()).determine(&mut io).await;

        assert!(matches!(result, Err(PlanningError::Cancelled)));
        assert_eq!(mock.call_count(), 0);
    }
}
