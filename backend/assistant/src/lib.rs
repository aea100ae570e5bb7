//! Chatbot for the portfolio site.
//!
//! [`Assistant`] forwards a visitor's message (with prior turns) to an LLM
//! provider and degrades to a keyword-matched canned reply whenever the
//! provider is missing or fails.

pub mod assistant;
pub mod fallback;
pub mod providers;

pub use assistant::{Assistant, AssistantReply, ReplySource};
pub use fallback::canned_reply;
