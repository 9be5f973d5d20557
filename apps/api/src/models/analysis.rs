use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a skill-gap analysis.
///
/// `Pending` is the column default and may appear in persisted data, but the
/// pipeline itself creates records directly in `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Processing => "PROCESSING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AnalysisStatus::Pending),
            "PROCESSING" => Ok(AnalysisStatus::Processing),
            "COMPLETED" => Ok(AnalysisStatus::Completed),
            "FAILED" => Ok(AnalysisStatus::Failed),
            other => Err(format!("unknown analysis status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProfile {
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchData {
    /// 0 – 100
    pub percentage: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub ai_explanation: String,
}

/// A persisted comparison between a candidate's résumé and a target role.
///
/// `extracted_profile` and `match_data` are set together, and only by
/// [`SkillGapAnalysis::complete`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapAnalysis {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub target_job_id: Option<Uuid>,
    pub target_role_name: String,
    pub status: AnalysisStatus,
    pub extracted_profile: Option<ExtractedProfile>,
    pub match_data: Option<MatchData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillGapAnalysis {
    /// A fresh record in `Processing`, ready to be handed to the store.
    pub fn start(user_id: Option<Uuid>, target_job_id: Option<Uuid>, target_role_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            target_job_id,
            target_role_name: target_role_name.to_string(),
            status: AnalysisStatus::Processing,
            extracted_profile: None,
            match_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self, profile: ExtractedProfile, match_data: MatchData) {
        self.extracted_profile = Some(profile);
        self.match_data = Some(match_data);
        self.status = AnalysisStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self) {
        self.extracted_profile = None;
        self.match_data = None;
        self.status = AnalysisStatus::Failed;
        self.updated_at = Utc::now();
    }

    /// Guest analyses (no owner) are readable by anyone holding the id.
    pub fn is_visible_to(&self, requester: Option<Uuid>) -> bool {
        match self.user_id {
            None => true,
            Some(owner) => requester == Some(owner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub title: String,
    pub url: String,
    /// "article" | "video" | "course" as reported by the model.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub step_order: u32,
    pub focus_area: String,
    pub description: String,
    pub recommended_resources: Vec<LearningResource>,
    pub skills_addressed: Vec<String>,
}

/// Ordered milestones addressing an analysis's missing skills.
/// One per completed analysis; `step_order` is unique and strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRoadmap {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub estimated_completion_weeks: u32,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
}

impl LearningRoadmap {
    pub fn has_ordered_steps(&self) -> bool {
        self.milestones
            .windows(2)
            .all(|pair| pair[0].step_order < pair[1].step_order)
    }
}
