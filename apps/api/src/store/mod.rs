//! Persistence Interface: every read and write the core performs goes through
//! these traits. `PgStore` backs production; `MemoryStore` backs ephemeral
//! deployments and tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::analysis::{LearningRoadmap, SkillGapAnalysis};
use crate::models::chat::{ChatMessage, ChatSession, ChatSessionSummary};
use crate::models::user::{ApplicationSummary, UserProfile};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Analyses and their roadmaps. Status transitions are driven only by the
/// skill-gap pipeline.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()>;

    async fn update_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()>;

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<SkillGapAnalysis>>;

    /// Newest first.
    async fn list_analyses(&self, user_id: Uuid) -> StoreResult<Vec<SkillGapAnalysis>>;

    async fn latest_analysis(&self, user_id: Uuid) -> StoreResult<Option<SkillGapAnalysis>>;

    async fn insert_roadmap(&self, roadmap: &LearningRoadmap) -> StoreResult<()>;

    async fn get_roadmap(&self, analysis_id: Uuid) -> StoreResult<Option<LearningRoadmap>>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Matches on id *and* owner; a guest (`None`) only finds ownerless sessions.
    async fn find_session(&self, id: Uuid, owner: Option<Uuid>)
        -> StoreResult<Option<ChatSession>>;

    /// Upserts the session row and appends `appended`, which must be the tail
    /// of `session.messages`. Earlier messages are never rewritten.
    async fn save_session(&self, session: &ChatSession, appended: &[ChatMessage])
        -> StoreResult<()>;

    /// Most recently updated first.
    async fn list_sessions(&self, owner: Uuid, limit: usize)
        -> StoreResult<Vec<ChatSessionSummary>>;
}

/// User Profile Store and Application Store. Both are owned elsewhere; the
/// core only reads them.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Newest first, at most `limit` rows, including applications whose job
    /// has since been deleted.
    async fn recent_applications(&self, user_id: Uuid, limit: usize)
        -> StoreResult<Vec<ApplicationSummary>>;
}
