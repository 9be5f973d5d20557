pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::skill_gap::handlers as skill_gap;
use crate::state::AppState;

/// Résumé uploads are the largest bodies the service accepts.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Skill-Gap API
        .route(
            "/skill-gap/analyze",
            post(skill_gap::handle_analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/skill-gap/results/:id", get(skill_gap::handle_get_result))
        .route("/skill-gap/history", get(skill_gap::handle_history))
        // AI Chat API
        .route("/ai-chat/message", post(chat::handle_send_message))
        .route("/ai-chat/history", get(chat::handle_chat_history))
        .route("/ai-chat/session/:id", get(chat::handle_get_session))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::USER_ID_HEADER;
    use crate::config::Config;
    use crate::llm_client::testing::{Script, ScriptedGateway};
    use crate::llm_client::{AiGateway, Provider};
    use crate::store::MemoryStore;

    const BOUNDARY: &str = "career-api-test-boundary";

    fn test_state(gateway: ScriptedGateway) -> AppState {
        let store = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn AiGateway> = Arc::new(gateway);
        AppState {
            config: Config {
                database_url: None,
                ai_provider: Provider::Groq,
                ai_api_key: None,
                ai_request_timeout: None,
                port: 0,
                rust_log: "info".to_string(),
            },
            gateway,
            analyses: store.clone(),
            sessions: store.clone(),
            profiles: store,
        }
    }

    fn analysis_output() -> Value {
        json!({
            "extractedProfile": {"skills": ["Python", "SQL"], "experienceYears": 2, "educationLevel": "BSc"},
            "matchData": {"percentage": 48, "matchedSkills": ["SQL"], "missingSkills": ["Tableau"], "aiExplanation": "Some overlap"},
            "roadmap": {"estimatedCompletionWeeks": 4, "milestones": [{"stepOrder": 1, "focusArea": "Tableau"}]}
        })
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"resume.txt\"\r\nContent-Type: text/plain\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn analyze_request(body: Body, user: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::post("/skill-gap/analyze").header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        builder.body(body).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(ScriptedGateway::chat(Some("ok"))));
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["aiCredentialConfigured"], false);
    }

    #[tokio::test]
    async fn test_analyze_upload_returns_analysis_and_roadmap() {
        let app = build_router(test_state(ScriptedGateway::structured(Script::Reply(
            analysis_output(),
        ))));
        let body = multipart_body(
            &[("targetRoleName", "Data Analyst")],
            Some(b"Python, SQL, 2 years experience"),
        );

        let (status, body) = send(app, analyze_request(body, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["status"], "COMPLETED");
        assert_eq!(body["analysis"]["targetRoleName"], "Data Analyst");
        assert_eq!(body["analysis"]["matchData"]["percentage"], 48);
        assert_eq!(body["roadmap"]["milestones"][0]["stepOrder"], 1);
    }

    #[tokio::test]
    async fn test_analyze_missing_role_is_bad_request() {
        let app = build_router(test_state(ScriptedGateway::structured(Script::Reply(
            analysis_output(),
        ))));
        let body = multipart_body(&[], Some(b"Python"));
        let (status, body) = send(app, analyze_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_malformed_job_id_is_bad_request() {
        let app = build_router(test_state(ScriptedGateway::structured(Script::Reply(
            analysis_output(),
        ))));
        let body = multipart_body(
            &[("targetRoleName", "Data Analyst"), ("targetJobId", "job-42")],
            Some(b"Python"),
        );
        let (status, _) = send(app, analyze_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_provider_failure_is_500_with_analysis_id() {
        let state = test_state(ScriptedGateway::structured(Script::Fail));
        let app = build_router(state.clone());
        let body = multipart_body(&[("targetRoleName", "Data Analyst")], Some(b"Python"));

        let (status, body) = send(app.clone(), analyze_request(body, None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "ANALYSIS_FAILED");

        let id = body["error"]["analysisId"].as_str().unwrap().to_string();
        let (status, body) = send(
            app,
            Request::get(format!("/skill-gap/results/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["status"], "FAILED");
        assert!(body["roadmap"].is_null());
        assert!(body["analysis"]["matchData"].is_null());
    }

    #[tokio::test]
    async fn test_results_of_another_user_are_forbidden() {
        let app = build_router(test_state(ScriptedGateway::structured(Script::Reply(
            analysis_output(),
        ))));
        let owner = Uuid::new_v4();
        let body = multipart_body(&[("targetRoleName", "Data Analyst")], Some(b"Python"));
        let (_, created) = send(app.clone(), analyze_request(body, Some(owner))).await;
        let id = created["analysis"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            app.clone(),
            Request::get(format!("/skill-gap/results/{id}"))
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            app,
            Request::get(format!("/skill-gap/results/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_requires_identity() {
        let app = build_router(test_state(ScriptedGateway::chat(Some("ok"))));
        let (status, _) = send(
            app.clone(),
            Request::get("/skill-gap/history").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app,
            Request::get("/skill-gap/history")
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analyses"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_round_trip_for_signed_in_user() {
        let app = build_router(test_state(ScriptedGateway::chat(Some(
            "Practice STAR-format answers.",
        ))));
        let user = Uuid::new_v4().to_string();

        let (status, body) = send(
            app.clone(),
            Request::post("/ai-chat/message")
                .header("content-type", "application/json")
                .header(USER_ID_HEADER, &user)
                .body(Body::from(r#"{"message": "How do I prepare for interviews?"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Practice STAR-format answers.");
        assert_eq!(body["chatHistory"].as_array().unwrap().len(), 2);
        let session_id = body["sessionId"].as_str().unwrap().to_string();

        let (status, body) = send(
            app.clone(),
            Request::get("/ai-chat/history")
                .header(USER_ID_HEADER, &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessions"][0]["id"], session_id.as_str());
        assert!(body["sessions"][0].get("messages").is_none());

        let (status, body) = send(
            app.clone(),
            Request::get(format!("/ai-chat/session/{session_id}"))
                .header(USER_ID_HEADER, &user)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["messages"][1]["role"], "assistant");

        let (status, _) = send(
            app,
            Request::get(format!("/ai-chat/session/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_session_id_starts_new_session() {
        let app = build_router(test_state(ScriptedGateway::chat(Some("Start with your CV."))));
        let (status, body) = send(
            app,
            Request::post("/ai-chat/message")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"message": "Where do I start?", "sessionId": "not-a-session"}"#,
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(Uuid::parse_str(body["sessionId"].as_str().unwrap()).is_ok());
        assert_eq!(body["chatHistory"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_path_ids_are_json_not_found() {
        let app = build_router(test_state(ScriptedGateway::chat(Some("ok"))));
        for uri in ["/ai-chat/session/not-a-session", "/skill-gap/results/42"] {
            let (status, body) =
                send(app.clone(), Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"]["code"], "NOT_FOUND", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_bad_request() {
        let app = build_router(test_state(ScriptedGateway::chat(Some("ok"))));
        let (status, _) = send(
            app,
            Request::post("/ai-chat/message")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": ""}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_provider_failure_is_generic_500() {
        let app = build_router(test_state(ScriptedGateway::chat(None)));
        let (status, body) = send(
            app,
            Request::post("/ai-chat/message")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": "Salary negotiation tips?"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An AI processing error occurred");
    }
}
