//! AutoEvolver - turn an objective into a tree of classified tasks
//!
//! A session asks the user for an objective, has the oracle judge whether it
//! fits the stated capabilities, then lists, classifies, and subdivides tasks
//! until every one can be acted on.

pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod documents;
pub mod domain;
pub mod llm;
pub mod planning;
pub mod presenter;
pub mod prompts;
pub mod session;
