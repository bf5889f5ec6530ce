//! Planning module - feasibility gate and task decomposition
//!
//! # Architecture
//!
//! ```text
//! User Input → FeasibilityGate → Objective → Decomposer → Vec<Task>
//!                    ↑                           ↑
//!              LLM (Yes/No, why)       LLM (list, classify, subdivide)
//! ```
//!
//! The engine talks to the user only through `SessionIo`, and to the oracle
//! only through `BotAgent`.

mod classifier;
mod decomposer;
mod error;
pub mod events;
mod feasibility;

pub use classifier::{TaskClassifier, parse_tag};
pub use decomposer::{Decomposer, DecomposerConfig, parse_listing, splice_expansions};
pub use error::PlanningError;
pub use events::{InputRequest, PlanEvent, SessionIo, SnapshotStage};
pub use feasibility::{Assessment, FeasibilityGate, GateState};
