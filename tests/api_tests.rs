use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use stylesense::{
    app::build_app,
    auth::InMemorySessions,
    config::{AppConfig, LlmConfig, SessionConfig},
    llm::{LlmError, TextGenerator},
    state::AppState,
};
use tower::ServiceExt;

const OUTFIT: &str = r#"```json
{
  "outfit_title": "Garden Wedding Classic",
  "outfit_description": "A-line midi dress in sage with a defined waist.",
  "color_palette": ["sage", "ivory", "gold"],
  "accessories": ["pearl earrings", "satin clutch", "nude block heels"],
  "hairstyle": "low chignon",
  "styling_explanation": "The A-line skirt balances the hips.",
  "color_of_the_day": "sage",
  "budget_note": "Achievable with mid-range high street pieces."
}
```"#;

/// Replies with a fixed text and counts calls.
struct ScriptedGenerator {
    reply: Result<&'static str, u16>,
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(LlmError::Api {
                status,
                message: "upstream unavailable".into(),
            }),
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        session: SessionConfig { ttl_minutes: 60 },
        llm: LlmConfig {
            api_key: "unused".into(),
            model: "scripted".into(),
            base_url: "http://localhost".into(),
            timeout_secs: 1,
            max_retries: 0,
        },
    }
}

async fn spawn_app_with(reply: Result<&'static str, u16>) -> (Router, Arc<ScriptedGenerator>) {
    let config = test_config();
    let db = stylesense::db::connect(&config.database_url)
        .await
        .expect("in-memory db");
    let generator = Arc::new(ScriptedGenerator {
        reply,
        calls: AtomicUsize::new(0),
    });
    let state = AppState::from_parts(
        db,
        Arc::new(config),
        Arc::new(InMemorySessions::new(60)),
        generator.clone(),
    );
    (build_app(state), generator)
}

async fn spawn_app() -> Router {
    spawn_app_with(Ok(OUTFIT)).await.0
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
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

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, email: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "secret123" })),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

fn style_request() -> Value {
    json!({
        "body_type": "pear",
        "occasion": "wedding",
        "weather": "sunny",
        "budget": "medium",
        "style_preference": "classic"
    })
}

#[tokio::test]
async fn health_reports_app_name() {
    let app = spawn_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "app": "StyleSense" }));
}

#[tokio::test]
async fn register_login_and_recommend_end_to_end() {
    let app = spawn_app().await;

    let (status, body) = register(&app, "ava", "ava@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Registration successful!");
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "ava");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = login(&app, "ava", "secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful!");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "ava");
    assert_eq!(me["email"], "ava@example.com");

    let (status, body) = send(&app, "POST", "/api/recommend", Some(&token), Some(style_request())).await;
    assert_eq!(status, StatusCode::OK);

    let rec = &body["recommendation"];
    for field in [
        "outfit_title",
        "outfit_description",
        "color_palette",
        "accessories",
        "hairstyle",
        "styling_explanation",
        "color_of_the_day",
        "budget_note",
    ] {
        assert!(!rec[field].is_null(), "missing field {field}");
    }
    assert_eq!(rec["outfit_title"], "Garden Wedding Classic");

    let links = body["pinterest_links"].as_object().unwrap();
    assert_eq!(links.len(), 4);
    for key in ["full_outfit", "accessories", "hairstyle", "color_palette"] {
        let url = links[key]["url"].as_str().unwrap();
        let (_, query) = url.split_once("?q=").unwrap();
        assert!(!query.is_empty(), "empty query for {key}");
    }

    let (status, body) = send(&app, "GET", "/api/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["occasion"], "wedding");
    assert_eq!(history[0]["style_preference"], "classic");
    assert_eq!(history[0]["outfit_title"], "Garden Wedding Classic");
    assert_eq!(history[0]["color_of_the_day"], "sage");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn_app().await;
    assert_eq!(register(&app, "ava", "ava@example.com").await.0, StatusCode::OK);

    let (status, body) = register(&app, "ava", "other@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username or email already exists.");

    let (status, _) = register(&app, "bea", "ava@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_registration_input_is_rejected() {
    let app = spawn_app().await;
    let (status, body) = register(&app, "ava", "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn malformed_bodies_and_queries_get_a_detail() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "ava" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("email"));

    let (_, body) = register(&app, "ava", "ava@example.com").await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/history?limit=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/recommend",
        Some(&token),
        Some(json!({ "occasion": "wedding" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn wrong_password_gets_no_token() {
    let app = spawn_app().await;
    register(&app, "ava", "ava@example.com").await;

    let (status, body) = login(&app, "ava", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("access_token").is_none());

    let (status, _) = login(&app, "nobody", "secret123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let (app, generator) = spawn_app_with(Ok(OUTFIT)).await;

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/history", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid or expired token");

    let (status, _) = send(&app, "POST", "/api/recommend", None, Some(style_request())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = spawn_app().await;
    let (_, body) = register(&app, "ava", "ava@example.com").await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully!");

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out again, or without a token, still succeeds.
    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn generation_failure_is_a_500_and_nothing_is_stored() {
    let (app, generator) = spawn_app_with(Err(503)).await;
    let (_, body) = register(&app, "ava", "ava@example.com").await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/api/recommend", Some(&token), Some(style_request())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("generation failed"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let (_, body) = send(&app, "GET", "/api/history", Some(&token), None).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unparseable_model_output_is_a_500() {
    let (app, _) = spawn_app_with(Ok("Sorry, I can't help with that.")).await;
    let (_, body) = register(&app, "ava", "ava@example.com").await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", "/api/recommend", Some(&token), Some(style_request())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn history_is_limited_and_private() {
    let app = spawn_app().await;
    let (_, ava) = register(&app, "ava", "ava@example.com").await;
    let (_, bea) = register(&app, "bea", "bea@example.com").await;
    let ava_token = ava["access_token"].as_str().unwrap().to_string();
    let bea_token = bea["access_token"].as_str().unwrap().to_string();

    for _ in 0..7 {
        let (status, _) =
            send(&app, "POST", "/api/recommend", Some(&ava_token), Some(style_request())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/api/history", Some(&ava_token), None).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 5);

    let (_, body) = send(&app, "GET", "/api/history?limit=3", Some(&ava_token), None).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/history?limit=100", Some(&ava_token), None).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 7);

    let (_, body) = send(&app, "GET", "/api/history", Some(&bea_token), None).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}
