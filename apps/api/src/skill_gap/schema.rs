//! Validation of the provider's skill-gap JSON.
//!
//! The provider is asked for an exact schema but nothing enforces it. Missing
//! leaves default (empty list, 0, empty string); a missing top-level section
//! is a [`SchemaError`].

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::analysis::{ExtractedProfile, LearningResource, MatchData, Milestone};

#[derive(Debug, Error)]
#[error("AI output does not match the analysis schema: {0}")]
pub struct SchemaError(pub String);

/// Roadmap content before it is attached to a persisted analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapDraft {
    pub estimated_completion_weeks: u32,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub profile: ExtractedProfile,
    pub match_data: MatchData,
    pub roadmap: RoadmapDraft,
}

pub fn validate_analysis_output(value: &Value) -> Result<AnalysisOutcome, SchemaError> {
    let root = value
        .as_object()
        .ok_or_else(|| SchemaError("top-level value is not an object".to_string()))?;

    let profile = section(root, "extractedProfile")?;
    let matching = section(root, "matchData")?;
    let roadmap = section(root, "roadmap")?;

    Ok(AnalysisOutcome {
        profile: ExtractedProfile {
            skills: string_list(profile, "skills"),
            experience_years: number(profile, "experienceYears").max(0.0),
            education_level: text(profile, "educationLevel"),
        },
        match_data: normalize_match(matching),
        roadmap: RoadmapDraft {
            estimated_completion_weeks: number(roadmap, "estimatedCompletionWeeks")
                .round()
                .max(0.0) as u32,
            milestones: normalize_milestones(roadmap),
        },
    })
}

fn section<'a>(root: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    root.get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError(format!("missing '{key}' object")))
}

fn normalize_match(matching: &Map<String, Value>) -> MatchData {
    let matched_skills = string_list(matching, "matchedSkills");
    let matched: HashSet<String> = matched_skills.iter().map(|s| s.to_lowercase()).collect();

    // A skill cannot be both matched and missing; matched wins.
    let missing_skills = string_list(matching, "missingSkills")
        .into_iter()
        .filter(|s| !matched.contains(&s.to_lowercase()))
        .collect();

    MatchData {
        percentage: number(matching, "percentage").round().clamp(0.0, 100.0) as u8,
        matched_skills,
        missing_skills,
        ai_explanation: text(matching, "aiExplanation"),
    }
}

/// Sorts milestones by the model's `stepOrder` (position breaks ties) and
/// renumbers them 1..n so the persisted order is unique and increasing.
fn normalize_milestones(roadmap: &Map<String, Value>) -> Vec<Milestone> {
    let raw = roadmap
        .get("milestones")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut ordered: Vec<(f64, usize, &Map<String, Value>)> = raw
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(position, m)| {
            let step = m
                .get("stepOrder")
                .and_then(as_number)
                .unwrap_or((position + 1) as f64);
            (step, position, m)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, (_, _, m))| Milestone {
            step_order: (index + 1) as u32,
            focus_area: text(m, "focusArea"),
            description: text(m, "description"),
            recommended_resources: resources(m),
            skills_addressed: string_list(m, "skillsAddressed"),
        })
        .collect()
}

fn resources(milestone: &Map<String, Value>) -> Vec<LearningResource> {
    milestone
        .get("recommendedResources")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|r| LearningResource {
                    title: text(r, "title"),
                    url: text(r, "url"),
                    kind: text(r, "type"),
                })
                .filter(|r| !(r.title.is_empty() && r.url.is_empty()))
                .collect()
        })
        .unwrap_or_default()
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Trimmed, non-empty strings, de-duplicated case-insensitively (first wins).
fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter(|s| seen.insert(s.to_lowercase()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn number(obj: &Map<String, Value>, key: &str) -> f64 {
    obj.get(key).and_then(as_number).unwrap_or(0.0)
}

/// Accepts JSON numbers and numeric strings such as "72" or "72%".
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
