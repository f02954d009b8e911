// Core completion-endpoint functionality shared by the Zoey crates:
// - API client for OpenAI-compatible chat completions
// - Request/response data structures
// - Configuration loading
// - Shared error types

// Export client module - API client for chat completions
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
