//! Decomposer - turns an objective into a flat list of terminal tasks
//!
//! One listing prompt produces the initial tasks. Then, pass by pass, every
//! task tagged `Subdivide` is listed again on its own and replaced in place by
//! its subtasks, until no `Subdivide` task remains.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PlanEvent, PlanningError, SessionIo, SnapshotStage, TaskClassifier};
use crate::agent::BotAgent;
use crate::domain::{Objective, Task};
use crate::prompts::{PromptContext, PromptLoader};

/// Configuration for decomposition
#[derive(Debug, Clone, Default)]
pub struct DecomposerConfig {
    /// Bound on subdivision passes; `None` keeps going until the fixpoint
    pub max_passes: Option<u32>,
}

/// Keep the lines of a listing reply that start with `-`, verbatim
pub fn parse_listing(response: &str) -> Vec<String> {
    response
        .lines()
        .filter(|line| line.starts_with('-'))
        .map(str::to_string)
        .collect()
}

/// Replace each indexed item with its expansion, keeping everything else in order
///
/// Indices refer to positions before any replacement and must be distinct.
/// Replacements are applied from the back so earlier indices stay valid.
pub fn splice_expansions<T>(items: &mut Vec<T>, mut expansions: Vec<(usize, Vec<T>)>) {
    expansions.sort_by_key(|(index, _)| *index);
    for (index, replacement) in expansions.into_iter().rev() {
        if index >= items.len() {
            warn!(index, len = items.len(), "splice_expansions: index out of range, skipped");
            continue;
        }
        items.splice(index..=index, replacement);
    }
}

/// Decomposer drives the split/classify/subdivide loop
pub struct Decomposer {
    agent: BotAgent,
    classifier: TaskClassifier,
    prompts: Arc<PromptLoader>,
    config: DecomposerConfig,
}

impl Decomposer {
    /// Create a new decomposer
    pub fn new(
        agent: BotAgent,
        classifier: TaskClassifier,
        prompts: Arc<PromptLoader>,
        config: DecomposerConfig,
    ) -> Self {
        debug!(max_passes = ?config.max_passes, "Decomposer::new: called");
        Self {
            agent,
            classifier,
            prompts,
            config,
        }
    }

    /// Decompose an accepted objective into terminal tasks
    ///
    /// A successful return never contains a `Subdivide` task.
    pub async fn decompose(&self, objective: &Objective, io: &mut dyn SessionIo) -> Result<Vec<Task>, PlanningError> {
        info!(objective = %objective.objective(), "Decomposing objective into tasks");

        let ctx = PromptContext::for_objective(objective);
        let mut tasks = self.list_tasks("split", &ctx, objective, None, io).await?;
        io.notify(PlanEvent::Snapshot {
            stage: SnapshotStage::Initial,
            tasks: tasks.clone(),
        });

        let mut pass = 0u32;
        loop {
            let pending: Vec<usize> = tasks
                .iter()
                .enumerate()
                .filter(|(_, task)| task.is_subdividable())
                .map(|(index, _)| index)
                .collect();

            if pending.is_empty() {
                debug!(%pass, "Decomposer::decompose: fixpoint reached");
                break;
            }

            if let Some(max) = self.config.max_passes
                && pass >= max
            {
                warn!(passes = pass, pending = pending.len(), "Subdivision pass limit reached");
                return Err(PlanningError::PassLimitExceeded {
                    passes: pass,
                    pending: pending.len(),
                });
            }

            pass += 1;
            info!(pass, pending = pending.len(), "Subdivision pass");

            for &index in &pending {
                let content = tasks[index].content.clone();
                let task_ctx = ctx.clone().with_task(content.clone());
                let subtasks = self
                    .list_tasks("subdivide", &task_ctx, objective, Some(&content), io)
                    .await?;
                io.notify(PlanEvent::Snapshot {
                    stage: SnapshotStage::Subdivided { pass },
                    tasks: subtasks.clone(),
                });
                tasks[index].set_subtasks(subtasks);
            }

            let expansions = pending
                .iter()
                .map(|&index| (index, tasks[index].take_subtasks()))
                .collect();
            splice_expansions(&mut tasks, expansions);

            io.notify(PlanEvent::Snapshot {
                stage: SnapshotStage::Pass { pass },
                tasks: tasks.clone(),
            });
        }

        io.notify(PlanEvent::Snapshot {
            stage: SnapshotStage::Confirmed,
            tasks: tasks.clone(),
        });
        info!(task_count = tasks.len(), passes = pass, "Decomposition complete");
        Ok(tasks)
    }

    /// Ask for a listing, keep its `-` lines and classify each one
    async fn list_tasks(
        &self,
        template: &str,
        ctx: &PromptContext,
        objective: &Objective,
        parent: Option<&str>,
        io: &mut dyn SessionIo,
    ) -> Result<Vec<Task>, PlanningError> {
        debug!(%template, ?parent, "Decomposer::list_tasks: called");
        let prompt = self.prompts.render(template, ctx).map_err(PlanningError::prompt)?;
        let response = self.agent.ask(prompt).await?;
        io.notify(PlanEvent::OracleReturned);

        let lines = parse_listing(&response);
        if lines.is_empty() {
            warn!(%template, ?parent, "Listing reply contained no '-' lines");
            io.notify(PlanEvent::EmptyListing {
                task: parent.map(str::to_string),
            });
        }

        let mut tasks = Vec::with_capacity(lines.len());
        for line in lines {
            let task = self.classifier.build_task(objective, &line, io).await?;
            tasks.push(task);
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskTag;
    use crate::llm::client::mock::MockLlmClient;
    use crate::planning::events::recording::RecordingIo;
    use proptest::prelude::*;

    fn decomposer(mock: &Arc<MockLlmClient>, max_passes: Option<u32>) -> Decomposer {
        let agent = BotAgent::new(mock.clone(), "test-model", 256);
        let prompts = Arc::new(PromptLoader::embedded_only());
        let classifier = TaskClassifier::new(agent.spawn(), prompts.clone(), 0);
        Decomposer::new(agent, classifier, prompts, DecomposerConfig { max_passes })
    }

    fn objective() -> Objective {
        Objective::new("Write a greeting function", "Python").unwrap()
    }

    fn contents(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.content.as_str()).collect()
    }

    #[test]
    fn test_parse_listing_keeps_hyphen_lines_verbatim() {
        let reply = "Here you go:\n- print greeting\n  - indented\n-return greeting\n\n* star";
        assert_eq!(parse_listing(reply), vec!["- print greeting", "-return greeting"]);
        assert!(parse_listing("no list here").is_empty());
        assert_eq!(parse_listing("- only"), vec!["- only"]);
    }

    #[test]
    fn test_splice_expansions_from_back() {
        let mut items = vec!["a", "B", "c", "D", "e"];
        splice_expansions(&mut items, vec![(1, vec!["b1", "b2"]), (3, vec![])]);
        assert_eq!(items, vec!["a", "b1", "b2", "c", "e"]);
    }

    proptest! {
        #[test]
        fn prop_splice_preserves_order(
            len in 1usize..12,
            picks in proptest::collection::vec((any::<prop::sample::Index>(), 0usize..4), 0..6),
        ) {
            let original: Vec<(usize, usize)> = (0..len).map(|i| (i, usize::MAX)).collect();
            let mut chosen = std::collections::BTreeMap::new();
            for (idx, k) in picks {
                chosen.insert(idx.index(len), k);
            }
            let expansions: Vec<(usize, Vec<(usize, usize)>)> = chosen
                .iter()
                .map(|(&i, &k)| (i, (0..k).map(|j| (i, j)).collect()))
                .collect();

            let mut items = original.clone();
            splice_expansions(&mut items, expansions);

            let mut expected = Vec::new();
            for item in &original {
                match chosen.get(&item.0) {
                    Some(&k) => expected.extend((0..k).map(|j| (item.0, j))),
                    None => expected.push(*item),
                }
            }
            prop_assert_eq!(items, expected);
        }
    }

    #[tokio::test]
    async fn test_scenario_terminal_tasks_need_no_pass() {
        let mock = Arc::new(MockLlmClient::with_replies(&[
            "- print greeting\n- return greeting",
            "3",
            "3",
        ]));
        let mut io = RecordingIo::default();

        let tasks = decomposer(&mock, None).decompose(&objective(), &mut io).await.unwrap();

        assert_eq!(contents(&tasks), vec!["- print greeting", "- return greeting"]);
        assert!(tasks.iter().all(|t| t.tag() == TaskTag::UsePython));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(
            io.snapshots(),
            vec![(SnapshotStage::Initial, 2), (SnapshotStage::Confirmed, 2)]
        );
        assert_eq!(io.count(&PlanEvent::OracleReturned), 3);
    }

    #[tokio::test]
    async fn test_classification_reask_pumps_per_oracle_call() {
        let mock = Arc::new(MockLlmClient::with_replies(&["- print greeting", "garbled", "3"]));
        let agent = BotAgent::new(mock.clone(), "test-model", 256);
        let prompts = Arc::new(PromptLoader::embedded_only());
        let classifier = TaskClassifier::new(agent.spawn(), prompts.clone(), 1);
        let decomposer = Decomposer::new(agent, classifier, prompts, DecomposerConfig { max_passes: None });
        let mut io = RecordingIo::default();

        let tasks = decomposer.decompose(&objective(), &mut io).await.unwrap();

        assert_eq!(tasks[0].tag(), TaskTag::UsePython);
        assert_eq!(mock.call_count(), 3);
        assert_eq!(io.count(&PlanEvent::OracleReturned), mock.call_count());
    }

    #[tokio::test]
    async fn test_scenario_subdivide_replaced_in_place() {
        let mock = Arc::new(MockLlmClient::with_replies(&[
            "- first\n- big\n- last",
            "2",
            "4",
            "1",
            "- part A\n- part B",
            "3",
            "2",
        ]));
        let mut io = RecordingIo::default();

        let tasks = decomposer(&mock, None).decompose(&objective(), &mut io).await.unwrap();

        assert_eq!(contents(&tasks), vec!["- first", "- part A", "- part B", "- last"]);
        assert_eq!(tasks[1].tag(), TaskTag::UsePython);
        assert_eq!(tasks[2].tag(), TaskTag::UseBot);
        assert!(tasks.iter().all(|t| t.subtasks().is_empty()));

        let subdivide_prompt = &mock.requests()[4].messages[0].content;
        assert!(subdivide_prompt.contains("The task to subdivide is - big."));
        assert!(subdivide_prompt.contains("Write a greeting function"));

        assert_eq!(
            io.snapshots(),
            vec![
                (SnapshotStage::Initial, 3),
                (SnapshotStage::Subdivided { pass: 1 }, 2),
                (SnapshotStage::Pass { pass: 1 }, 4),
                (SnapshotStage::Confirmed, 4),
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_subdivision_reaches_fixpoint() {
        let mock = Arc::new(MockLlmClient::with_replies(&[
            "- a\n- b",
            "4",
            "4",
            // pass 1: a
            "- a1\n- a2",
            "4",
            "0",
            // pass 1: b
            "- b1",
            "2",
            // pass 2: a1
            "- a1x",
            "1",
        ]));
        let mut io = RecordingIo::default();

        let tasks = decomposer(&mock, None).decompose(&objective(), &mut io).await.unwrap();

        assert_eq!(contents(&tasks), vec!["- a1x", "- a2", "- b1"]);
        assert!(tasks.iter().all(|t| t.tag().is_terminal()));
        assert!(io.snapshots().contains(&(SnapshotStage::Pass { pass: 2 }, 3)));
    }

    #[tokio::test]
    async fn test_pass_limit_exceeded() {
        let mock = Arc::new(MockLlmClient::with_replies(&["- loop", "4", "- loop again", "4"]));
        let mut io = RecordingIo::default();

        let result = decomposer(&mock, Some(1)).decompose(&objective(), &mut io).await;

        assert!(matches!(
            result,
            Err(PlanningError::PassLimitExceeded { passes: 1, pending: 1 })
        ));
    }

    #[tokio::test]
    async fn test_empty_listing_warns_and_yields_nothing() {
        let mock = Arc::new(MockLlmClient::with_replies(&["I cannot list anything."]));
        let mut io = RecordingIo::default();

        let tasks = decomposer(&mock, None).decompose(&objective(), &mut io).await.unwrap();

        assert!(tasks.is_empty());
        assert_eq!(io.count(&PlanEvent::EmptyListing { task: None }), 1);
    }

    #[tokio::test]
    async fn test_empty_subdivision_removes_task() {
        let mock = Arc::new(MockLlmClient::with_replies(&["- keep\n- vague", "2", "4", "nothing"]));
        let mut io = RecordingIo::default();

        let tasks = decomposer(&mock, None).decompose(&objective(), &mut io).await.unwrap();

        assert_eq!(contents(&tasks), vec!["- keep"]);
        assert_eq!(
            io.count(&PlanEvent::EmptyListing {
                task: Some("- vague".to_string())
            }),
            1
        );
    }

    #[tokio::test]
    async fn test_classifier_parse_error_aborts() {
        let mock = Arc::new(MockLlmClient::with_replies(&["- print greeting", "7"]));
        let mut io = RecordingIo::default();

        let result = decomposer(&mock, None).decompose(&objective(), &mut io).await;
        assert!(matches!(result, Err(PlanningError::Parse { .. })));
    }
}
