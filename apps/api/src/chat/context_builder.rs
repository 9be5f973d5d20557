//! Context Builder: a short natural-language briefing about the caller,
//! injected into the assistant's system instruction.
//!
//! Never fails: guests get a fixed briefing, lookup failures an empty one.

use std::fmt::Write;

use tracing::warn;
use uuid::Uuid;

use crate::models::analysis::SkillGapAnalysis;
use crate::models::user::{ApplicationSummary, UserProfile};
use crate::store::{AnalysisStore, ProfileStore, StoreResult};

pub const RECENT_APPLICATION_LIMIT: usize = 3;

pub const GUEST_BRIEFING: &str = "You are speaking to an anonymous guest user who is not logged in. \
    Encourage them to create an account for personalized job matching and skill tracking.";

pub const UNKNOWN_USER_BRIEFING: &str = "You are speaking to an unknown user.";

pub async fn build_briefing(
    profiles: &dyn ProfileStore,
    analyses: &dyn AnalysisStore,
    user_id: Option<Uuid>,
) -> String {
    let Some(user_id) = user_id else {
        return GUEST_BRIEFING.to_string();
    };

    match gather(profiles, analyses, user_id).await {
        Ok(briefing) => briefing,
        Err(e) => {
            warn!("Context builder failed for user {user_id}, continuing without context: {e}");
            String::new()
        }
    }
}

async fn gather(
    profiles: &dyn ProfileStore,
    analyses: &dyn AnalysisStore,
    user_id: Uuid,
) -> StoreResult<String> {
    let Some(user) = profiles.find_user(user_id).await? else {
        return Ok(UNKNOWN_USER_BRIEFING.to_string());
    };
    let latest = analyses.latest_analysis(user_id).await?;
    let applications = profiles
        .recent_applications(user_id, RECENT_APPLICATION_LIMIT)
        .await?;

    Ok(render_briefing(&user, latest.as_ref(), &applications))
}

fn render_briefing(
    user: &UserProfile,
    latest: Option<&SkillGapAnalysis>,
    applications: &[ApplicationSummary],
) -> String {
    let mut out = format!("Name: {}\nRole: {}\n", user.fullname, user.role);

    if let Some(analysis) = latest {
        // FAILED/PROCESSING analyses have no match data; report zeros rather
        // than dropping the section.
        let (percentage, matched, missing) = match &analysis.match_data {
            Some(m) => (m.percentage, join_or_none(&m.matched_skills), join_or_none(&m.missing_skills)),
            None => (0, join_or_none(&[]), join_or_none(&[])),
        };
        let _ = write!(
            out,
            "\n[Skill Gap Status for {}]\nMatch Percentage: {percentage}%\nMatched Skills: {matched}\nMissing Skills: {missing}\n",
            analysis.target_role_name
        );
    }

    let live: Vec<_> = applications
        .iter()
        .take(RECENT_APPLICATION_LIMIT)
        .filter_map(|a| a.job_title.as_deref().map(|title| (title, a.status.as_str())))
        .collect();
    if !live.is_empty() {
        out.push_str("\n[Recent Job Applications]\n");
        for (title, status) in live {
            let _ = writeln!(out, "- Applied for {title} (Status: {status})");
        }
    }

    out
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}
