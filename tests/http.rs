//! HTTP tests: the real Gemini/OpenAI clients against a local stub of the
//! remote API, and the desk's own JSON API served from a test resolver.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use inspection_desk::config::{LlmConfig, ResolverConfig};
use inspection_desk::llm::{create_client_with_key, GeminiClient, LanguageModel};
use inspection_desk::models::{NotificationDataset, NotificationRecord, ReferenceDocument};
use inspection_desk::resolver::QueryResolver;
use inspection_desk::server::run_server_with_resolver;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// What the stub saw: request path, headers, and body.
#[derive(Clone, Default)]
struct StubLog {
    requests: Arc<Mutex<Vec<(String, HeaderMap, Value)>>>,
}

/// Binds a listener on an ephemeral port and serves `app` in the background.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

async fn gemini_ok(
    State(log): State<StubLog>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    log.requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), headers, body));
    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "Conforme o " }, { "text": "Art. 45." }] },
            "finishReason": "STOP"
        }]
    }))
}

async fn gemini_overloaded() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "The model is overloaded")
}

async fn openai_ok(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let model = body["model"].as_str().unwrap_or("").to_string();
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": format!("{} {}", auth, model) } }]
    }))
}

async fn stub_gemini(log: StubLog) -> String {
    let app = Router::new().fallback(gemini_ok).with_state(log);
    spawn(app).await
}

async fn stub_failing_gemini() -> String {
    let app = Router::new().fallback(gemini_overloaded);
    spawn(app).await
}

// ─── Model clients ──────────────────────────────────────────────────

#[tokio::test]
async fn gemini_client_sends_prompt_and_key() {
    let log = StubLog::default();
    let base = stub_gemini(log.clone()).await;

    let client = GeminiClient::new("gemini-1.5-flash", "secret-key", base, 10).unwrap();
    let answer = client.generate("Qual o recuo?").await.unwrap();
    assert_eq!(answer.text, "Conforme o Art. 45.");

    let requests = log.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (path, headers, body) = &requests[0];
    assert_eq!(path, "/v1beta/models/gemini-1.5-flash:generateContent");
    assert_eq!(headers.get("x-goog-api-key").unwrap(), "secret-key");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Qual o recuo?");
}

#[tokio::test]
async fn gemini_error_status_carries_body() {
    let base = stub_failing_gemini().await;
    let client = GeminiClient::new("gemini-1.5-flash", "k", base, 10).unwrap();

    let err = client.generate("x").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("503"), "{}", msg);
    assert!(msg.contains("The model is overloaded"), "{}", msg);
}

#[tokio::test]
async fn openai_client_uses_bearer_auth() {
    let app = Router::new().route("/v1/chat/completions", post(openai_ok));
    let base = spawn(app).await;

    let config = LlmConfig {
        provider: "openai".to_string(),
        model: Some("gpt-test".to_string()),
        base_url: Some(base),
        ..LlmConfig::default()
    };
    let client = create_client_with_key(&config, "sk-test".to_string()).unwrap();
    let answer = client.generate("hello").await.unwrap();
    assert_eq!(answer.text, "Bearer sk-test gpt-test");
}

#[tokio::test]
async fn unreachable_service_is_an_error_not_an_empty_answer() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let client = GeminiClient::new("gemini-1.5-flash", "k", "http://127.0.0.1:9", 5).unwrap();
    assert!(client.generate("x").await.is_err());
}

// ─── Desk HTTP API ──────────────────────────────────────────────────

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_server(port: u16) {
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        if reqwest::get(&url).await.is_ok() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("server did not start on port {}", port);
}

/// Starts the desk API backed by the Gemini stub; returns the API base URL.
async fn start_desk(model_base: Option<String>) -> String {
    let model = model_base.map(|base| {
        let client: Arc<dyn LanguageModel> =
            Arc::new(GeminiClient::new("gemini-1.5-flash", "k", base, 10).unwrap());
        client
    });
    let mut record = NotificationRecord::new("Rua Principal, 100");
    record.status = Some("Pendente".to_string());
    let resolver = QueryResolver::new(
        Some(NotificationDataset::new(vec![record])),
        Some(ReferenceDocument::from_pages(&["Art. 45 - Muros de divisa."])),
        model,
        ResolverConfig::default(),
    );

    let port = free_port();
    let bind = format!("127.0.0.1:{}", port);
    let resolver = Arc::new(resolver);
    tokio::spawn(async move {
        run_server_with_resolver(&bind, resolver).await.ok();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn ask_notifications_returns_model_answer() {
    let log = StubLog::default();
    let model_base = stub_gemini(log.clone()).await;
    let api = start_desk(Some(model_base)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask/notifications", api))
        .json(&json!({ "query": "Qual o status?", "address": "rua principal 100" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "answered");
    assert_eq!(body["answer"], "Conforme o Art. 45.");

    let requests = log.requests.lock().unwrap();
    let prompt = requests[0].2["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("- Status: Pendente"));
}

#[tokio::test]
async fn ask_code_reports_model_failure_as_answer() {
    let model_base = stub_failing_gemini().await;
    let api = start_desk(Some(model_base)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask/code", api))
        .json(&json!({ "question": "Qual a altura do muro?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "service_unavailable");
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("Error processing the query:"));
    assert!(answer.contains("The model is overloaded"));
}

#[tokio::test]
async fn ask_with_no_match_reports_outcome() {
    let api = start_desk(None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask/notifications", api))
        .json(&json!({ "query": "status?", "address": "Avenida Atlântica 5000" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "no_match");
}

#[tokio::test]
async fn empty_query_is_bad_request() {
    let api = start_desk(None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask/code", api))
        .json(&json!({ "question": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn sources_lists_model_state() {
    let api = start_desk(None).await;

    let body: Value = reqwest::get(format!("{}/sources", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["name"], "spreadsheet");
    assert_eq!(sources[0]["healthy"], true);
    assert_eq!(sources[2]["name"], "model");
    assert_eq!(sources[2]["healthy"], false);
}
