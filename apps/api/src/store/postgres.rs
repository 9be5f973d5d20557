use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::analysis::{
    ExtractedProfile, LearningRoadmap, MatchData, Milestone, SkillGapAnalysis,
};
use crate::models::chat::{ChatMessage, ChatSession, ChatSessionSummary};
use crate::models::user::{ApplicationSummary, UserProfile};
use crate::store::{AnalysisStore, ChatStore, ProfileStore, StoreError, StoreResult};

/// PostgreSQL-backed store. The `users`, `applications` and `jobs` tables
/// belong to the job-board service and are read-only here.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: Uuid,
    user_id: Option<Uuid>,
    target_job_id: Option<Uuid>,
    target_role_name: String,
    status: String,
    extracted_profile: Option<Json<ExtractedProfile>>,
    match_data: Option<Json<MatchData>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for SkillGapAnalysis {
    type Error = StoreError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(SkillGapAnalysis {
            id: row.id,
            user_id: row.user_id,
            target_job_id: row.target_job_id,
            target_role_name: row.target_role_name,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            extracted_profile: row.extracted_profile.map(|j| j.0),
            match_data: row.match_data.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoadmapRow {
    id: Uuid,
    analysis_id: Uuid,
    estimated_completion_weeks: i32,
    milestones: Json<Vec<Milestone>>,
    created_at: DateTime<Utc>,
}

impl From<RoadmapRow> for LearningRoadmap {
    fn from(row: RoadmapRow) -> Self {
        LearningRoadmap {
            id: row.id,
            analysis_id: row.analysis_id,
            estimated_completion_weeks: row.estimated_completion_weeks.max(0) as u32,
            milestones: row.milestones.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Option<Uuid>,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for ChatSessionSummary {
    fn from(row: SessionRow) -> Self {
        ChatSessionSummary {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

const ANALYSIS_COLUMNS: &str = "id, user_id, target_job_id, target_role_name, status, \
    extracted_profile, match_data, created_at, updated_at";

#[async_trait]
impl AnalysisStore for PgStore {
    async fn insert_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO skill_gap_analyses
                (id, user_id, target_job_id, target_role_name, status,
                 extracted_profile, match_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(analysis.id)
        .bind(analysis.user_id)
        .bind(analysis.target_job_id)
        .bind(&analysis.target_role_name)
        .bind(analysis.status.as_str())
        .bind(analysis.extracted_profile.as_ref().map(Json))
        .bind(analysis.match_data.as_ref().map(Json))
        .bind(analysis.created_at)
        .bind(analysis.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE skill_gap_analyses
            SET status = $2, extracted_profile = $3, match_data = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(analysis.id)
        .bind(analysis.status.as_str())
        .bind(analysis.extracted_profile.as_ref().map(Json))
        .bind(analysis.match_data.as_ref().map(Json))
        .bind(analysis.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<SkillGapAnalysis>> {
        let row: Option<AnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM skill_gap_analyses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SkillGapAnalysis::try_from).transpose()
    }

    async fn list_analyses(&self, user_id: Uuid) -> StoreResult<Vec<SkillGapAnalysis>> {
        let rows: Vec<AnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM skill_gap_analyses \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SkillGapAnalysis::try_from).collect()
    }

    async fn latest_analysis(&self, user_id: Uuid) -> StoreResult<Option<SkillGapAnalysis>> {
        let row: Option<AnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM skill_gap_analyses \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SkillGapAnalysis::try_from).transpose()
    }

    async fn insert_roadmap(&self, roadmap: &LearningRoadmap) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO learning_roadmaps
                (id, analysis_id, estimated_completion_weeks, milestones, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(roadmap.id)
        .bind(roadmap.analysis_id)
        .bind(roadmap.estimated_completion_weeks as i32)
        .bind(Json(&roadmap.milestones))
        .bind(roadmap.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_roadmap(&self, analysis_id: Uuid) -> StoreResult<Option<LearningRoadmap>> {
        let row: Option<RoadmapRow> = sqlx::query_as(
            "SELECT id, analysis_id, estimated_completion_weeks, milestones, created_at \
             FROM learning_roadmaps WHERE analysis_id = $1",
        )
        .bind(analysis_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LearningRoadmap::from))
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn find_session(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> StoreResult<Option<ChatSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, updated_at FROM chat_sessions \
             WHERE id = $1 AND user_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let messages: Vec<MessageRow> = sqlx::query_as(
            "SELECT role, content, created_at FROM chat_messages \
             WHERE session_id = $1 ORDER BY seq ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ChatSession {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            messages: messages
                .into_iter()
                .map(ChatMessage::try_from)
                .collect::<StoreResult<_>>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn save_session(
        &self,
        session: &ChatSession,
        appended: &[ChatMessage],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (id) DO UPDATE SET updated_at = NOW()
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.title)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        // Append-only: never UPDATE earlier messages. The upsert above holds the
        // session row lock, so concurrent turns on one session take seq numbers
        // one after the other instead of colliding.
        for message in appended {
            sqlx::query(
                "INSERT INTO chat_messages (session_id, seq, role, content, created_at) \
                 SELECT $1, COALESCE(MAX(seq), -1) + 1, $2, $3, $4 \
                 FROM chat_messages WHERE session_id = $1",
            )
            .bind(session.id)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_sessions(
        &self,
        owner: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<ChatSessionSummary>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at, updated_at FROM chat_sessions \
             WHERE user_id = $1 ORDER BY updated_at DESC LIMIT $2",
        )
        .bind(owner)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ChatSessionSummary::from).collect())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(
            sqlx::query_as::<_, UserProfile>("SELECT id, fullname, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn recent_applications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<ApplicationSummary>> {
        Ok(sqlx::query_as::<_, ApplicationSummary>(
            r#"
            SELECT j.title AS job_title, a.status, a.created_at AS applied_at
            FROM applications a
            LEFT JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
            ORDER BY a.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }
}
