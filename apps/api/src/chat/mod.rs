// Conversational career assistant: bounded history window, per-user context
// briefing, append-only transcripts.

pub mod context_builder;
pub mod handlers;
pub mod session;
pub mod window;
