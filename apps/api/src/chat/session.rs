//! Chat Session Manager: the only writer of `ChatSession.messages`.
//!
//! Flow per turn: resolve/create session → append user message → window the
//! transcript → build briefing → generate reply → append reply → persist.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::context_builder::build_briefing;
use crate::chat::window::{ContextWindow, CONTEXT_WINDOW_SIZE};
use crate::errors::AppError;
use crate::llm_client::AiGateway;
use crate::models::chat::{ChatMessage, ChatSession, ChatSessionSummary};
use crate::store::{AnalysisStore, ChatStore, ProfileStore};

/// Sessions returned by `list_history`.
pub const HISTORY_PAGE_SIZE: usize = 20;
const TITLE_CHARS: usize = 30;

/// Collaborators a chat turn needs.
pub struct ChatDeps<'a> {
    pub sessions: &'a dyn ChatStore,
    pub profiles: &'a dyn ProfileStore,
    pub analyses: &'a dyn AnalysisStore,
    pub gateway: &'a dyn AiGateway,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: String,
    pub chat_history: Vec<ChatMessage>,
}

pub async fn send_message(
    deps: &ChatDeps<'_>,
    user_id: Option<Uuid>,
    session_id: Option<Uuid>,
    text: &str,
) -> Result<ChatReply, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let mut session = resolve_session(deps.sessions, user_id, session_id, text).await?;
    let first_new = session.messages.len();

    session.messages.push(ChatMessage::user(text));

    let window = ContextWindow::from_transcript(CONTEXT_WINDOW_SIZE, &session.messages);
    debug_assert!(!window.is_empty());
    debug!(
        "Session {}: forwarding {} of {} messages",
        session.id,
        window.len(),
        session.messages.len()
    );

    let briefing = build_briefing(deps.profiles, deps.analyses, user_id).await;
    let reply = deps
        .gateway
        .generate_conversational(&window.into_messages(), &briefing)
        .await?;

    session.messages.push(ChatMessage::assistant(&reply));
    session.updated_at = Utc::now();
    deps.sessions
        .save_session(&session, &session.messages[first_new..])
        .await?;

    Ok(ChatReply {
        session_id: session.id,
        reply,
        chat_history: session.messages,
    })
}

/// Looks up `session_id` for this owner; a miss (or no id) starts a new
/// session titled after the first message.
async fn resolve_session(
    sessions: &dyn ChatStore,
    user_id: Option<Uuid>,
    session_id: Option<Uuid>,
    text: &str,
) -> Result<ChatSession, AppError> {
    if let Some(id) = session_id {
        if let Some(session) = sessions.find_session(id, user_id).await? {
            return Ok(session);
        }
        info!("Chat session {id} not found for caller, starting a new one");
    }
    Ok(ChatSession::new(user_id, derive_title(text)))
}

pub async fn list_history(
    sessions: &dyn ChatStore,
    user_id: Option<Uuid>,
) -> Result<Vec<ChatSessionSummary>, AppError> {
    // Guests have no identity to list by.
    let Some(user_id) = user_id else {
        return Ok(Vec::new());
    };
    Ok(sessions.list_sessions(user_id, HISTORY_PAGE_SIZE).await?)
}

pub async fn get_session(
    sessions: &dyn ChatStore,
    user_id: Option<Uuid>,
    session_id: Uuid,
) -> Result<ChatSession, AppError> {
    sessions
        .find_session(session_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

fn derive_title(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::context_builder::GUEST_BRIEFING;
    use crate::llm_client::prompts::OFF_TOPIC_REFUSAL;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::models::chat::MessageRole;
    use crate::store::MemoryStore;

    fn deps<'a>(store: &'a MemoryStore, gateway: &'a ScriptedGateway) -> ChatDeps<'a> {
        ChatDeps {
            sessions: store,
            profiles: store,
            analyses: store,
            gateway,
        }
    }

    #[tokio::test]
    async fn test_off_topic_guest_question_gets_refusal() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some(OFF_TOPIC_REFUSAL));

        let reply = send_message(&deps(&store, &gateway), None, None, "What's the capital of France?")
            .await
            .unwrap();

        assert_eq!(reply.reply, OFF_TOPIC_REFUSAL);
        assert_eq!(reply.chat_history.len(), 2);
        assert_eq!(gateway.briefings.lock().unwrap()[0], GUEST_BRIEFING);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_session() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("ok"));
        let user = Uuid::new_v4();

        let err = send_message(&deps(&store, &gateway), Some(user), None, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_history(&store, Some(user)).await.unwrap().is_empty());
        assert!(gateway.chat_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forwarded_window_is_bounded() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("Keep practicing SQL."));
        let user = Uuid::new_v4();
        let deps = deps(&store, &gateway);

        let first = send_message(&deps, Some(user), None, "message 0").await.unwrap();
        for i in 1..10 {
            send_message(&deps, Some(user), Some(first.session_id), &format!("message {i}"))
                .await
                .unwrap();
        }
        // 20 stored messages; one more turn must still forward only 15.
        let session = get_session(&store, Some(user), first.session_id).await.unwrap();
        assert_eq!(session.messages.len(), 20);

        let reply = send_message(&deps, Some(user), Some(first.session_id), "message 10")
            .await
            .unwrap();

        let forwarded = gateway.last_forwarded();
        assert_eq!(forwarded.len(), CONTEXT_WINDOW_SIZE);
        assert_eq!(forwarded.last().unwrap().content, "message 10");
        assert!(forwarded.iter().all(|m| m.role != MessageRole::System));
        assert_eq!(reply.chat_history.len(), 22);
    }

    #[tokio::test]
    async fn test_transcript_is_append_only_and_ordered() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("Tailor your resume."));
        let deps = deps(&store, &gateway);

        let first = send_message(&deps, None, None, "How do I improve my resume?")
            .await
            .unwrap();
        let second = send_message(&deps, None, Some(first.session_id), "And my cover letter?")
            .await
            .unwrap();

        assert_eq!(second.session_id, first.session_id);
        assert_eq!(&second.chat_history[..2], &first.chat_history[..]);
        let roles: Vec<_> = second.chat_history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert!(second
            .chat_history
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_foreign_session_id_starts_new_session() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("Sure."));
        let deps = deps(&store, &gateway);
        let owner = Uuid::new_v4();

        let owned = send_message(&deps, Some(owner), None, "Interview tips?").await.unwrap();
        let intruder = send_message(&deps, Some(Uuid::new_v4()), Some(owned.session_id), "hi")
            .await
            .unwrap();

        assert_ne!(intruder.session_id, owned.session_id);
        assert_eq!(intruder.chat_history.len(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_persists_nothing() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(None);
        let user = Uuid::new_v4();

        let err = send_message(&deps(&store, &gateway), Some(user), None, "Salary advice?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert!(list_history(&store, Some(user)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("Sure."));
        let user = Uuid::new_v4();
        let sent = send_message(&deps(&store, &gateway), Some(user), None, "Hello")
            .await
            .unwrap();

        assert_eq!(
            list_history(&store, Some(user)).await.unwrap(),
            list_history(&store, Some(user)).await.unwrap()
        );
        assert_eq!(
            get_session(&store, Some(user), sent.session_id).await.unwrap(),
            get_session(&store, Some(user), sent.session_id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_get_session_requires_owner() {
        let store = MemoryStore::new();
        let gateway = ScriptedGateway::chat(Some("Sure."));
        let sent = send_message(&deps(&store, &gateway), Some(Uuid::new_v4()), None, "Hello")
            .await
            .unwrap();

        let err = get_session(&store, None, sent.session_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(list_history(&store, None).await.unwrap().is_empty());
    }

    #[test]
    fn test_title_is_first_thirty_chars() {
        assert_eq!(derive_title("Short question"), "Short question");
        let long = "How should I prepare for a senior data analyst interview?";
        let title = derive_title(long);
        assert_eq!(title, "How should I prepare for a sen...");
        assert_eq!(title.chars().count(), TITLE_CHARS + 3);
    }
}
