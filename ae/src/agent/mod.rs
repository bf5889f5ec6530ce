//! Conversation participants
//!
//! `BotAgent` wraps the oracle; `Narrator` voices the fixed system and user
//! personas. Both implement `Speaker`.

mod bot;
mod message;
mod speaker;

pub use bot::BotAgent;
pub use message::{ChatMessage, SenderInfo};
pub use speaker::{Narrator, Speaker};
