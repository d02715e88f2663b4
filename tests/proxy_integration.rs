//! End-to-end tests: the data proxy over real TCP, with Gemini and
//! Supabase replaced by mock HTTP servers.

use std::net::SocketAddr;
use std::sync::Arc;

use fitness_proxy::api::{data_proxy_router, gateway_router, RouterOptions};
use fitness_proxy::config::{Config, StoreSettings};
use fitness_proxy::gemini::GeminiClient;
use fitness_proxy::store::SupabaseStore;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing Gemini at the mock server.
fn test_config(upstream: &MockServer) -> Config {
    Config {
        gemini_api_base: upstream.uri(),
        gemini_model: "test-model".to_string(),
        gemini_api_key: Some("server-secret".to_string()),
        supabase_url: Some(upstream.uri()),
        supabase_anon_key: Some("anon-key".to_string()),
        ..Default::default()
    }
}

/// Start the router on an ephemeral port and return its base URL.
async fn spawn(router: axum::Router) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn spawn_data_proxy(upstream: &MockServer) -> String {
    let config = test_config(upstream);
    let settings: StoreSettings = config.store_settings().unwrap();
    let store = SupabaseStore::new(&settings, &config).unwrap();
    let gemini = GeminiClient::new(&config).unwrap();

    spawn(data_proxy_router(
        gemini,
        Arc::new(store),
        &RouterOptions::default(),
    ))
    .await
}

#[tokio::test]
async fn generate_injects_server_key() {
    let upstream = MockServer::start().await;
    let payload = json!({ "contents": [{ "parts": [{ "text": "suggest a warmup" }] }] });
    let reply = json!({ "candidates": [{ "content": { "parts": [{ "text": "jumping jacks" }] } }] });

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(query_param("key", "server-secret"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
        .expect(1)
        .mount(&upstream)
        .await;

    let gemini = GeminiClient::new(&test_config(&upstream)).unwrap();
    let base = spawn(gateway_router(gemini, &RouterOptions::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/proxy-generate"))
        .json(&json!({ "payload": payload }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, reply);
}

#[tokio::test]
async fn sessions_round_trip_through_supabase() {
    let upstream = MockServer::start().await;
    let exercises = json!([{ "name": "deadlift", "sets": 3 }]);

    Mock::given(method("POST"))
        .and(path("/rest/v1/sessions"))
        .and(header("apikey", "anon-key"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({
            "user_id": "u1",
            "total_volume": 100,
            "exercises": exercises
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 1,
            "user_id": "u1",
            "total_volume": 100,
            "exercises": exercises,
            "created_at": "2025-09-18T09:00:00+00:00"
        }])))
        .expect(1)
        .mount(&upstream)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/sessions"))
        .and(query_param("user_id", "eq.u1"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "user_id": "u1", "created_at": "2025-09-19T09:00:00+00:00" },
            { "id": 1, "user_id": "u1", "created_at": "2025-09-18T09:00:00+00:00" }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = spawn_data_proxy(&upstream).await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{base}/api/sessions"))
        .header("x-user-id", "u1")
        .json(&json!({ "total_volume": 100, "exercises": exercises }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created[0]["user_id"], json!("u1"));

    let listed = client
        .get(format!("{base}/api/sessions"))
        .header("x-user-id", "u1")
        .send()
        .await
        .unwrap();
    assert_eq!(listed.status(), 200);
    let listed: Value = listed.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);
    assert_eq!(listed[0]["id"], json!(2));
}

#[tokio::test]
async fn store_error_text_is_not_leaked() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/nutrition"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "permission denied for table nutrition" })),
        )
        .mount(&upstream)
        .await;

    let base = spawn_data_proxy(&upstream).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/nutrition"))
        .header("x-user-id", "u2")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let text = response.text().await.unwrap();
    assert!(!text.contains("permission denied"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_user_id_never_reaches_supabase() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&upstream)
        .await;

    let base = spawn_data_proxy(&upstream).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/sessions"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}
