//! bidtab - Construction Bid Table Extractor
//!
//! Turns normalized construction documents into validated, source-cited
//! requirement tables via:
//! - Bounded keyword-window context reduction (lexical, deterministic)
//! - Strict JSON structured-output validation with a cite-every-value contract
//! - A single bounded repair attempt per topic, never more than two chat calls
//! - Concurrent per-topic pipelines aggregated into one ordered result

pub mod types;
pub mod extractor;
pub mod prompt;
pub mod validator;
pub mod chat;
pub mod http_chat;
pub mod engine;
pub mod topics;
pub mod server;

pub use types::*;
pub use chat::{ChatClient, ChatError, ScriptedChatClient};
pub use engine::{aggregate, BidEngine};
pub use http_chat::{ChatConfig, HttpChatClient};
pub use topics::default_topics;
