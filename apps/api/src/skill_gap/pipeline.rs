//! Skill-Gap Analysis Pipeline: owns every status transition of an analysis.
//!
//! Flow: validate → create (PROCESSING) → extract text → truncate →
//!       generate_structured → validate schema → COMPLETED + roadmap.
//!
//! Provider and schema failures are recorded as FAILED and reported to the
//! caller. Nothing is retried.

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::document::extract_text;
use crate::errors::AppError;
use crate::llm_client::AiGateway;
use crate::models::analysis::{LearningRoadmap, SkillGapAnalysis};
use crate::skill_gap::schema::{validate_analysis_output, AnalysisOutcome};
use crate::store::{AnalysisStore, StoreError};

/// Résumé prefix forwarded to the provider, in characters.
pub const RESUME_PREFIX_CHARS: usize = 5_000;

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub document: Bytes,
    pub content_type: Option<String>,
    pub target_role_name: String,
    pub target_job_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// An analysis together with its roadmap. `roadmap` is `None` unless the
/// analysis completed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis: SkillGapAnalysis,
    pub roadmap: Option<LearningRoadmap>,
}

/// Runs one analysis end to end.
///
/// Steps:
/// 1. Reject empty documents / role names (no record is created)
/// 2. INSERT analysis with status PROCESSING
/// 3. Extract text and keep the first `RESUME_PREFIX_CHARS` characters
/// 4. generate_structured + schema validation; on failure → FAILED, return error
/// 5. UPDATE analysis to COMPLETED, INSERT roadmap
pub async fn analyze(
    store: &dyn AnalysisStore,
    gateway: &dyn AiGateway,
    request: AnalyzeRequest,
) -> Result<AnalysisReport, AppError> {
    // Step 1: Validate
    if request.document.is_empty() {
        return Err(AppError::Validation(
            "Missing required fields: file or targetRoleName".to_string(),
        ));
    }
    let target_role = request.target_role_name.trim();
    if target_role.is_empty() {
        return Err(AppError::Validation(
            "Missing required fields: file or targetRoleName".to_string(),
        ));
    }

    // Step 2: Track the run
    let mut analysis = SkillGapAnalysis::start(request.user_id, request.target_job_id, target_role);
    store.insert_analysis(&analysis).await?;
    info!(
        "Started skill-gap analysis {} for role '{}' (user: {:?})",
        analysis.id, target_role, request.user_id
    );

    // Step 3: Extract
    let extracted = extract_text(request.document, request.content_type.as_deref()).await;
    if extracted.is_degraded() {
        warn!(
            "Analysis {} is using degraded raw-decoded resume text",
            analysis.id
        );
    }
    let resume_text = truncate_chars(&extracted.text, RESUME_PREFIX_CHARS);

    // Step 4: Generate + validate
    let outcome = match generate(gateway, resume_text, target_role).await {
        Ok(outcome) => outcome,
        Err(reason) => return Err(record_failure(store, analysis, reason).await),
    };

    // Step 5: Persist
    let AnalysisOutcome {
        profile,
        match_data,
        roadmap,
    } = outcome;
    analysis.complete(profile, match_data);

    let roadmap = LearningRoadmap {
        id: Uuid::new_v4(),
        analysis_id: analysis.id,
        estimated_completion_weeks: roadmap.estimated_completion_weeks,
        milestones: roadmap.milestones,
        created_at: Utc::now(),
    };
    debug_assert!(roadmap.has_ordered_steps());

    // A COMPLETED record must never be left without its roadmap.
    if let Err(e) = persist_completion(store, &analysis, &roadmap).await {
        return Err(record_failure(store, analysis, format!("store error: {e}")).await);
    }

    info!(
        "Completed analysis {}: {}% match, {} milestones",
        analysis.id,
        analysis.match_data.as_ref().map_or(0, |m| m.percentage),
        roadmap.milestones.len()
    );

    Ok(AnalysisReport {
        analysis,
        roadmap: Some(roadmap),
    })
}

async fn persist_completion(
    store: &dyn AnalysisStore,
    analysis: &SkillGapAnalysis,
    roadmap: &LearningRoadmap,
) -> Result<(), StoreError> {
    store.update_analysis(analysis).await?;
    store.insert_roadmap(roadmap).await
}

/// Moves the run to FAILED (best effort) and builds the caller-facing error.
async fn record_failure(
    store: &dyn AnalysisStore,
    mut analysis: SkillGapAnalysis,
    reason: String,
) -> AppError {
    error!("Analysis {} failed: {reason}", analysis.id);
    analysis.fail();
    if let Err(e) = store.update_analysis(&analysis).await {
        error!("Could not record FAILED status for {}: {e}", analysis.id);
    }
    AppError::AnalysisFailed {
        analysis_id: analysis.id,
        reason,
    }
}

async fn generate(
    gateway: &dyn AiGateway,
    resume_text: &str,
    target_role: &str,
) -> Result<AnalysisOutcome, String> {
    let value = gateway
        .generate_structured(resume_text, target_role)
        .await
        .map_err(|e| {
            if e.is_schema_error() {
                format!("schema error: {e}")
            } else {
                format!("provider error: {e}")
            }
        })?;
    validate_analysis_output(&value).map_err(|e| format!("schema error: {e}"))
}

/// Fetches an analysis and its roadmap. Ownerless analyses are readable by
/// anyone holding the id.
pub async fn get_result(
    store: &dyn AnalysisStore,
    analysis_id: Uuid,
    requester: Option<Uuid>,
) -> Result<AnalysisReport, AppError> {
    let analysis = store
        .get_analysis(analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Analysis not found".to_string()))?;

    if !analysis.is_visible_to(requester) {
        return Err(AppError::Forbidden);
    }

    let roadmap = store.get_roadmap(analysis_id).await?;
    Ok(AnalysisReport { analysis, roadmap })
}

pub async fn list_for_user(
    store: &dyn AnalysisStore,
    user_id: Uuid,
) -> Result<Vec<SkillGapAnalysis>, AppError> {
    Ok(store.list_analyses(user_id).await?)
}

/// Longest prefix of at most `max_chars` characters, cut on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
