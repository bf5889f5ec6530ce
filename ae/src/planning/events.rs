//! Progress events and the I/O seam between the engine and the session
//!
//! The engine never prints or reads directly. It asks for input and reports
//! progress through `SessionIo`, which the session's message carrier
//! implements on top of the presenter.

use async_trait::async_trait;

use super::PlanningError;
use crate::domain::Task;

/// What the gate is asking the user for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRequest {
    Objective,
    Context,
}

/// Point in decomposition at which a task list snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStage {
    /// After the initial split
    Initial,
    /// One task's subdivision listing, during pass `pass`
    Subdivided { pass: u32 },
    /// Whole list after pass `pass` was spliced
    Pass { pass: u32 },
    /// Fixpoint reached
    Confirmed,
}

/// Progress reported by the planning engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEvent {
    /// The gate is about to consult the oracle
    AssessingFeasibility,
    /// The objective was judged infeasible; `reason` is the oracle's text, verbatim
    Rejected { reason: String },
    /// The objective was judged feasible
    Accepted,
    /// An empty objective was entered
    InvalidObjective,
    /// An oracle round trip finished; the presenter may flush pending UI work
    OracleReturned,
    /// Task list progress
    Snapshot { stage: SnapshotStage, tasks: Vec<Task> },
    /// A listing reply held no `-` lines; `task` is the subdivided task, if any
    EmptyListing { task: Option<String> },
}

/// Input and progress reporting used by the planning engine
#[async_trait]
pub trait SessionIo: Send {
    /// Suspend until the user supplies text; cancellation surfaces as `PlanningError::Cancelled`
    async fn request_input(&mut self, request: InputRequest) -> Result<String, PlanningError>;

    /// Report progress
    fn notify(&mut self, event: PlanEvent);
}
