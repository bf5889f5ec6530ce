//! Task domain type
//!
//! A Task is one unit of the decomposition tree, tagged with how it must
//! ultimately be resolved.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Version of the digit table shared by `TaskTag` and the classify prompts
///
/// Bump this whenever a digit is reassigned; the prompt wording is rendered
/// from `TaskTag::ALL`, so both move together.
pub const CLASSIFICATION_TABLE_VERSION: u32 = 1;

/// How a task must be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTag {
    /// Cannot be solved
    Unsolvable,
    /// Needs an answer from the user
    AskUser,
    /// The oracle writes the answer directly
    UseBot,
    /// Needs a new Python module written or run
    UsePython,
    /// Needs further breakdown
    Subdivide,
}

impl TaskTag {
    /// Every tag, in digit order
    pub const ALL: [TaskTag; 5] = [
        TaskTag::Unsolvable,
        TaskTag::AskUser,
        TaskTag::UseBot,
        TaskTag::UsePython,
        TaskTag::Subdivide,
    ];

    /// Map a classification digit to its tag
    pub fn from_digit(digit: u32) -> Option<Self> {
        debug!(%digit, "TaskTag::from_digit: called");
        match digit {
            0 => Some(Self::Unsolvable),
            1 => Some(Self::AskUser),
            2 => Some(Self::UseBot),
            3 => Some(Self::UsePython),
            4 => Some(Self::Subdivide),
            _ => {
                debug!("TaskTag::from_digit: digit outside table");
                None
            }
        }
    }

    /// The digit the oracle answers with for this tag
    pub fn digit(&self) -> u32 {
        match self {
            Self::Unsolvable => 0,
            Self::AskUser => 1,
            Self::UseBot => 2,
            Self::UsePython => 3,
            Self::Subdivide => 4,
        }
    }

    /// Meaning of the digit as worded in the classify prompt
    pub fn meaning(&self) -> &'static str {
        match self {
            Self::Unsolvable => "cannot be solved",
            Self::AskUser => "ask the user",
            Self::UseBot => "the assistant outputs the text directly",
            Self::UsePython => "write or run a new Python module to solve it",
            Self::Subdivide => "further divide into smaller tasks",
        }
    }

    /// Snake-case name, as shown in task listings
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unsolvable => "unsolvable",
            Self::AskUser => "ask_user",
            Self::UseBot => "use_bot",
            Self::UsePython => "use_python",
            Self::Subdivide => "subdivide",
        }
    }

    /// Any tag other than `Subdivide` ends recursive expansion
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Subdivide)
    }
}

impl std::fmt::Display for TaskTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One unit of work produced by the oracle
///
/// Only `content` is public. The tag is fixed at classification, and
/// `complete` is the only way to mark a task done, so `completed` always
/// comes with a `result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Oracle line, verbatim, including the leading `-`
    pub content: String,

    tag: TaskTag,

    completed: bool,

    /// Set iff `completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,

    /// Children awaiting splice during a subdivision pass
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subtasks: Vec<Task>,
}

impl Task {
    /// Create a classified, uncompleted task
    pub fn new(content: impl Into<String>, tag: TaskTag) -> Self {
        let content = content.into();
        debug!(%content, %tag, "Task::new: called");
        Self {
            content,
            tag,
            completed: false,
            result: None,
            subtasks: Vec::new(),
        }
    }

    /// The classification; fixed once the task exists
    pub fn tag(&self) -> TaskTag {
        self.tag
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Children listed for this task and not yet spliced into the list
    pub fn subtasks(&self) -> &[Task] {
        &self.subtasks
    }

    pub(crate) fn set_subtasks(&mut self, subtasks: Vec<Task>) {
        self.subtasks = subtasks;
    }

    /// Hand the pending children over for splicing, leaving none behind
    pub(crate) fn take_subtasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.subtasks)
    }

    /// Mark resolved with its output
    pub fn complete(&mut self, result: impl Into<String>) {
        debug!(content = %self.content, "Task::complete: called");
        self.completed = true;
        self.result = Some(result.into());
    }

    /// True when the task still needs breaking down
    pub fn is_subdividable(&self) -> bool {
        self.tag == TaskTag::Subdivide
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.content, self.tag)
    }
}
