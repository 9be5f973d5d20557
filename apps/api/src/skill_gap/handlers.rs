//! Axum route handlers for the Skill-Gap API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{OptionalUser, RequiredUser};
use crate::errors::AppError;
use crate::models::analysis::SkillGapAnalysis;
use crate::skill_gap::pipeline::{analyze, get_result, list_for_user, AnalysisReport, AnalyzeRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisListResponse {
    pub analyses: Vec<SkillGapAnalysis>,
}

/// POST /skill-gap/analyze
///
/// Multipart fields: `file` (résumé), `targetRoleName`, optional `targetJobId`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let request = read_analyze_form(multipart, user_id).await?;
    let report = analyze(state.analyses.as_ref(), state.gateway.as_ref(), request).await?;
    Ok(Json(report))
}

/// GET /skill-gap/results/:id
pub async fn handle_get_result(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
    Path(analysis_id): Path<String>,
) -> Result<Json<AnalysisReport>, AppError> {
    let analysis_id = Uuid::parse_str(&analysis_id)
        .map_err(|_| AppError::NotFound("Analysis not found".to_string()))?;
    let report = get_result(state.analyses.as_ref(), analysis_id, user_id).await?;
    Ok(Json(report))
}

/// GET /skill-gap/history
pub async fn handle_history(
    State(state): State<AppState>,
    RequiredUser(user_id): RequiredUser,
) -> Result<Json<AnalysisListResponse>, AppError> {
    let analyses = list_for_user(state.analyses.as_ref(), user_id).await?;
    Ok(Json(AnalysisListResponse { analyses }))
}

async fn read_analyze_form(
    mut multipart: Multipart,
    user_id: Option<Uuid>,
) -> Result<AnalyzeRequest, AppError> {
    let mut document = Bytes::new();
    let mut content_type = None;
    let mut target_role_name = String::new();
    let mut target_job_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                content_type = field.content_type().map(str::to_string);
                document = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
            }
            "targetRoleName" => {
                target_role_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read targetRoleName: {e}")))?;
            }
            "targetJobId" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read targetJobId: {e}")))?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    target_job_id = Some(Uuid::parse_str(raw).map_err(|_| {
                        AppError::Validation("targetJobId must be a valid id".to_string())
                    })?);
                }
            }
            _ => {}
        }
    }

    Ok(AnalyzeRequest {
        document,
        content_type,
        target_role_name,
        target_job_id,
        user_id,
    })
}
