use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::analysis::{LearningRoadmap, SkillGapAnalysis};
use crate::models::chat::{ChatMessage, ChatSession, ChatSessionSummary};
use crate::models::user::{ApplicationSummary, UserProfile};
use crate::store::{AnalysisStore, ChatStore, ProfileStore, StoreResult};

/// In-process store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    analyses: RwLock<HashMap<Uuid, SkillGapAnalysis>>,
    roadmaps: RwLock<HashMap<Uuid, LearningRoadmap>>,
    sessions: RwLock<HashMap<Uuid, ChatSession>>,
    users: RwLock<HashMap<Uuid, UserProfile>>,
    applications: RwLock<HashMap<Uuid, Vec<ApplicationSummary>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub async fn add_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn add_application(&self, user_id: Uuid, application: ApplicationSummary) {
        self.applications
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(application);
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn insert_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()> {
        self.analyses
            .write()
            .await
            .insert(analysis.id, analysis.clone());
        Ok(())
    }

    async fn update_analysis(&self, analysis: &SkillGapAnalysis) -> StoreResult<()> {
        self.analyses
            .write()
            .await
            .insert(analysis.id, analysis.clone());
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<SkillGapAnalysis>> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn list_analyses(&self, user_id: Uuid) -> StoreResult<Vec<SkillGapAnalysis>> {
        let mut analyses: Vec<_> = self
            .analyses
            .read()
            .await
            .values()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(analyses)
    }

    async fn latest_analysis(&self, user_id: Uuid) -> StoreResult<Option<SkillGapAnalysis>> {
        Ok(self
            .analyses
            .read()
            .await
            .values()
            .filter(|a| a.user_id == Some(user_id))
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn insert_roadmap(&self, roadmap: &LearningRoadmap) -> StoreResult<()> {
        self.roadmaps
            .write()
            .await
            .insert(roadmap.analysis_id, roadmap.clone());
        Ok(())
    }

    async fn get_roadmap(&self, analysis_id: Uuid) -> StoreResult<Option<LearningRoadmap>> {
        Ok(self.roadmaps.read().await.get(&analysis_id).cloned())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_session(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> StoreResult<Option<ChatSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&id)
            .filter(|s| s.user_id == owner)
            .cloned())
    }

    async fn save_session(
        &self,
        session: &ChatSession,
        appended: &[ChatMessage],
    ) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            // Append to what is stored, not to the caller's snapshot, so two
            // turns racing on one session both keep their messages.
            Some(stored) => {
                stored.messages.extend_from_slice(appended);
                stored.updated_at = Utc::now();
            }
            None => {
                let mut stored = session.clone();
                stored.updated_at = Utc::now();
                sessions.insert(session.id, stored);
            }
        }
        Ok(())
    }

    async fn list_sessions(
        &self,
        owner: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<ChatSessionSummary>> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == Some(owner))
            .map(ChatSession::summary)
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn recent_applications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<ApplicationSummary>> {
        let mut apps = self
            .applications
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        apps.truncate(limit);
        Ok(apps)
    }
}
