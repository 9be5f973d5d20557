use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Read-only view of a job-board user, owned by the profile service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub fullname: String,
    pub role: String,
}

/// A recent job application. `job_title` is `None` when the job was deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationSummary {
    pub job_title: Option<String>,
    pub status: String,
    pub applied_at: DateTime<Utc>,
}
