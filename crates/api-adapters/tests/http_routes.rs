//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use api_adapters::{router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use domains::{
    AppError, DonationRepo, IdentityProvider, Result, UserData, UserId, UserRepo, VerifiedIdentity,
};
use serde_json::{json, Value};
use services::Deps;
use storage_adapters::{DocumentRepos, MemoryDocumentStore};
use tower::ServiceExt;

/// Treats the bearer credential as the uid itself.
struct EchoIdentity;

#[async_trait]
impl IdentityProvider for EchoIdentity {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity> {
        if credential == "invalid" {
            return Err(AppError::Unauthenticated("invalid token".into()));
        }
        Ok(VerifiedIdentity {
            uid: UserId::new(credential),
            display_name: credential.to_uppercase(),
            email: format!("{credential}@example.com"),
            created_at: Utc::now(),
        })
    }

    async fn delete_account(&self, _uid: &UserId) -> Result<()> {
        Ok(())
    }
}

struct TestApp {
    router: Router,
    repos: DocumentRepos,
}

fn app() -> TestApp {
    app_with_body_limit(1024 * 1024)
}

fn app_with_body_limit(body_limit_bytes: usize) -> TestApp {
    let repos = DocumentRepos::new(Arc::new(MemoryDocumentStore::new()));
    let deps = Deps {
        donations: Arc::new(repos.clone()),
        users: Arc::new(repos.clone()),
        bans: Arc::new(repos.clone()),
        identity: Arc::new(EchoIdentity),
    };
    TestApp {
        router: router(AppState::new(deps), body_limit_bytes),
        repos,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(&self, uid: &str) {
        let (status, _) = self.send("POST", "/users/new", Some(uid), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn seed_admin(&self, uid: &str) {
        self.repos
            .create_user(&UserData {
                uid: UserId::new(uid),
                display_name: uid.into(),
                email: String::new(),
                registered_at: Utc::now(),
                admin: true,
                donations_made: 0,
                posts: vec![],
            })
            .await
            .unwrap();
    }

    async fn post_donation(&self, owner: &str, title: &str) -> String {
        let (status, body) = self
            .send("POST", "/donations/new", Some(owner), Some(json!({ "title": title })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let (status, body) = app().send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_credential_is_401() {
    let (status, body) = app()
        .send("POST", "/donations/new", None, Some(json!({ "title": "Lamp" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn test_rejected_credential_is_401() {
    let (status, _) = app().send("POST", "/users/new", Some("invalid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blank_title_is_400() {
    let app = app();
    app.register("alice").await;
    let (status, body) = app
        .send("POST", "/donations/new", Some("alice"), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let app = app_with_body_limit(64);
    app.register("alice").await;
    let (status, body) = app
        .send(
            "POST",
            "/donations/new",
            Some("alice"),
            Some(json!({ "title": "Lamp", "description": "x".repeat(256) })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "invalid_body");
    assert!(app.repos.list_donations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/users/new")
        .header(header::AUTHORIZATION, "bearer alice")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .method("POST")
        .uri("/users/new")
        .header(header::AUTHORIZATION, "Basic alice")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registering_twice_is_409() {
    let app = app();
    app.register("alice").await;
    let (status, _) = app.send("POST", "/users/new", Some("alice"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_donation_lifecycle() {
    let app = app();
    app.register("alice").await;
    app.register("bob").await;
    let id = app.post_donation("alice", "Bookshelf").await;

    let (status, donation) = app.send("GET", &format!("/donations/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donation["title"], "Bookshelf");
    assert_eq!(donation["owner_id"], "alice");

    let report = json!({ "donation_id": id });
    let (status, _) = app
        .send("POST", "/donations/report", Some("bob"), Some(report.clone()))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = app
        .send("POST", "/donations/report", Some("bob"), Some(report))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            "POST",
            "/donations/edit",
            Some("bob"),
            Some(json!({ "id": id, "data": { "title": "Mine now" } })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("POST", &format!("/donations/{id}/delete"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", &format!("/donations/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (_, user) = app.send("GET", "/users/alice", None, None).await;
    assert_eq!(user["posts"], json!([]));
    assert_eq!(user["donations_made"], 1);
}

#[tokio::test]
async fn test_admin_ban_flow() {
    let app = app();
    app.seed_admin("root").await;
    app.register("bob").await;
    app.post_donation("bob", "Chair").await;

    let (status, _) = app
        .send("POST", "/users/ban", Some("root"), Some(json!({ "userToBan": "bob" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, banned) = app.send("GET", "/users/banned?uid=bob", None, None).await;
    assert_eq!(banned["banned"], true);

    let (_, list) = app.send("GET", "/donations/list", None, None).await;
    assert_eq!(list, json!([]));

    let (status, _) = app.send("GET", "/users/bob", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("POST", "/donations/new", Some("bob"), Some(json!({ "title": "Again" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_query() {
    let app = app();
    app.seed_admin("root").await;
    app.register("bob").await;

    let (_, root) = app.send("GET", "/users/admin?uid=root", None, None).await;
    assert_eq!(root["admin"], true);
    let (_, bob) = app.send("GET", "/users/admin?uid=bob", None, None).await;
    assert_eq!(bob["admin"], false);
    let (status, _) = app.send("GET", "/users/admin?uid=ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_self_delete_without_body() {
    let app = app();
    app.register("carol").await;

    let (status, _) = app.send("POST", "/users/delete", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", "/users/carol", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, banned) = app.send("GET", "/users/banned?uid=carol", None, None).await;
    assert_eq!(banned["banned"], false);
}

#[tokio::test]
async fn test_deleting_another_account_is_403() {
    let app = app();
    app.register("carol").await;
    app.register("dave").await;

    let (status, _) = app
        .send("POST", "/users/delete", Some("carol"), Some(json!({ "uid": "dave" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_metrics_count_decisions() {
    let app = app();
    app.register("alice").await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(text.contains("relief_policy_decisions_total"));
    assert!(text.contains("action=\"CreateAccount\""));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let response = app()
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
