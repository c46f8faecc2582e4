pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::models::profile::{Accomplishment, Job, Project, Skill};
use crate::profile::handlers as profile;
use crate::profile::ProfileEntity;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Profile aggregate
        .route(
            "/api/profile/:user_id",
            get(profile::handle_get_profile)
                .put(profile::handle_update_profile)
                .delete(profile::handle_delete_profile),
        )
        // Chat
        .route("/api/chat", post(chat::handle_chat));

    let router = collection_routes::<Job>(router, "jobs");
    let router = collection_routes::<Skill>(router, "skills");
    let router = collection_routes::<Project>(router, "projects");
    let router = collection_routes::<Accomplishment>(router, "accomplishments");

    router.with_state(state)
}

/// Mounts the uniform add/get/update/delete routes for one child collection.
fn collection_routes<E: ProfileEntity>(router: Router<AppState>, name: &str) -> Router<AppState> {
    router
        .route(
            &format!("/api/profile/:user_id/{name}"),
            post(profile::handle_add_entity::<E>),
        )
        .route(
            &format!("/api/profile/:user_id/{name}/:entity_id"),
            get(profile::handle_get_entity::<E>)
                .put(profile::handle_update_entity::<E>)
                .delete(profile::handle_delete_entity::<E>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for Router::oneshot

    use crate::chat::{Guardrail, PromptTemplate};
    use crate::llm_client::MockAiClient;
    use crate::profile::ProfileService;
    use crate::storage::JsonStore;

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
        ai: Arc<MockAiClient>,
    }

    fn app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let ai = Arc::new(MockAiClient::new());
        let state = AppState {
            profiles: ProfileService::new(JsonStore::new(dir.path())),
            ai: ai.clone(),
            guardrail: Arc::new(Guardrail::new(20)),
            prompts: Arc::new(PromptTemplate::default()),
        };
        TestApp {
            _dir: dir,
            router: build_router(state),
            ai,
        }
    }

    impl TestApp {
        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
            let builder = Request::builder().method(method).uri(uri);
            let req = match body {
                Some(v) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(v.to_string())),
                None => builder.body(Body::empty()),
            }
            .unwrap();
            self.router.clone().oneshot(req).await.unwrap()
        }
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn profile_doc() -> Value {
        json!({
            "user": {"id": "u1", "name": "Jane Doe", "contact": {"email": "jane@example.com"}},
            "jobs": [],
            "skills": [],
            "projects": [],
            "accomplishments": []
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let resp = app.send("GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_profile_uses_error_envelope() {
        let app = app();
        let resp = app.send("GET", "/api/profile/nobody", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["message"].as_str().unwrap().contains("nobody"));
    }

    #[tokio::test]
    async fn test_job_add_get_delete_end_to_end() {
        let app = app();
        let resp = app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .send(
                "POST",
                "/api/profile/u1/jobs",
                Some(json!({"id": "", "company": "Acme", "title": "Engineer", "startDate": "2020-01"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let job = json_body(resp).await;
        let job_id = job["id"].as_str().unwrap().to_string();
        assert!(job_id.starts_with("job-"));
        assert_eq!(job_id.len(), "job-".len() + 8);

        let profile = json_body(app.send("GET", "/api/profile/u1", None).await).await;
        assert_eq!(profile["jobs"][0]["id"], job_id.as_str());
        assert_eq!(profile["jobs"][0]["startDate"], "2020-01");

        let uri = format!("/api/profile/u1/jobs/{job_id}");
        let resp = app.send("DELETE", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let profile = json_body(app.send("GET", "/api/profile/u1", None).await).await;
        assert_eq!(profile["jobs"], json!([]));

        let resp = app.send("DELETE", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_missing_accomplishment_is_not_found() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        let resp = app
            .send(
                "PUT",
                "/api/profile/u1/accomplishments/accomplishment-deadbeef",
                Some(json!({"statement": "Did a thing"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let profile = json_body(app.send("GET", "/api/profile/u1", None).await).await;
        assert_eq!(profile["accomplishments"], json!([]));
    }

    #[tokio::test]
    async fn test_skill_update_keeps_path_id() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        let skill = json_body(
            app.send(
                "POST",
                "/api/profile/u1/skills",
                Some(json!({"name": "Rust", "category": "Languages"})),
            )
            .await,
        )
        .await;
        let id = skill["id"].as_str().unwrap();

        let resp = app
            .send(
                "PUT",
                &format!("/api/profile/u1/skills/{id}"),
                Some(json!({"id": "skill-other", "name": "Rust", "category": "Languages",
                            "proficiency": "expert"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = json_body(resp).await;
        assert_eq!(updated["id"], id);
        assert_eq!(updated["proficiency"], "expert");

        let fetched = json_body(app.send("GET", &format!("/api/profile/u1/skills/{id}"), None).await).await;
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_delete_profile_route() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        let resp = app.send("DELETE", "/api/profile/u1", None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = app.send("GET", "/api/profile/u1", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_returns_assistant_message_and_usage() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        let resp = app
            .send(
                "POST",
                "/api/chat",
                Some(json!({
                    "userId": "u1",
                    "messages": [{"role": "user", "content": "Write a technical resume"}]
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["message"]["role"], "assistant");
        assert!(body["message"]["content"].as_str().unwrap().contains("Jane Doe"));
        assert_eq!(body["usage"], json!({"input_tokens": 150, "output_tokens": 300}));
        assert_eq!(app.ai.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_oversized_message_is_validation_error() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        let resp = app
            .send(
                "POST",
                "/api/chat",
                Some(json!({
                    "userId": "u1",
                    "messages": [{"role": "user", "content": "x".repeat(10_001)}]
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(resp).await["error"]["code"], "VALIDATION_ERROR");
        assert!(app.ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_chat_provider_failure_is_bad_gateway() {
        let app = app();
        app.send("PUT", "/api/profile/u1", Some(profile_doc())).await;
        app.ai.fail_with_status(503);
        let resp = app
            .send(
                "POST",
                "/api/chat",
                Some(json!({"userId": "u1", "messages": [{"role": "user", "content": "hi"}]})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(resp).await;
        assert_eq!(body["error"]["code"], "AI_SERVICE_ERROR");
        assert_eq!(body["error"]["message"], "AI service error");
    }
}
