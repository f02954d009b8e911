//! Conversation logic for the Zoey persona chat service.
//!
//! Everything here is request-scoped: the caller hands in the message, the
//! persona and the history it owns, and gets back the next prompt, a
//! structured payload, or a stream of chat bubbles.

pub mod chunker;
pub mod conversation;
pub mod error;
pub mod flow;
pub mod generator;
pub mod intent;
pub mod persona;
pub mod plans;
pub mod shop;
pub mod store;

pub use conversation::{ConversationTurn, Payload, TurnContent, TurnRole};
pub use error::{DialogueError, DialogueResult};
pub use flow::{Flow, FlowStep, ManagerStep, WorkoutStep};
pub use intent::Intent;
pub use persona::{Mode, Persona};
