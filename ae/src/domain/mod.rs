//! Domain types for AutoEvolver
//!
//! Core domain types: Task, TaskTag, Objective

mod objective;
mod task;

pub use objective::Objective;
pub use task::{CLASSIFICATION_TABLE_VERSION, Task, TaskTag};
