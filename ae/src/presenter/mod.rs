//! Presentation layer
//!
//! The session reads user input and shows chat lines only through `Presenter`,
//! so the same flow drives the terminal or a scripted test double.

mod console;

use async_trait::async_trait;

use crate::agent::ChatMessage;
use crate::planning::PlanningError;

pub use console::Console;

/// Displays chat lines and collects user input
#[async_trait]
pub trait Presenter: Send {
    /// Suspend until the user enters a line
    ///
    /// An interrupt or end of input returns `PlanningError::Cancelled`.
    async fn request_user_input(&mut self) -> Result<String, PlanningError>;

    /// Show one role-tagged line
    fn print_message(&mut self, message: &ChatMessage);

    /// Flush pending UI work; called after every oracle round trip
    fn process_pending_events(&mut self);
}
