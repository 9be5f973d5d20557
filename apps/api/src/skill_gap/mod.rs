// Skill-Gap Analysis: résumé upload → text extraction → structured AI call →
// schema validation → persisted analysis + learning roadmap.
// All provider calls go through llm_client.

pub mod handlers;
pub mod pipeline;
pub mod schema;
