use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use lccp_rag::core::config::NvidiaSettings;
use lccp_rag::llm::{Embedder, Generator, NvidiaClient};
use lccp_rag::rag::RagError;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

fn auth(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn embeddings(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let count = body["input"].as_array().map(Vec::len).unwrap_or(0);
    recorded
        .requests
        .lock()
        .unwrap()
        .push(("embeddings".to_string(), auth(&headers), body));

    // Reverse order so the client has to sort by index.
    let data: Vec<Value> = (0..count)
        .rev()
        .map(|i| json!({"index": i, "embedding": [i as f32, 1.0]}))
        .collect();
    Json(json!({"data": data}))
}

async fn completions(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded
        .requests
        .lock()
        .unwrap()
        .push(("chat".to_string(), auth(&headers), body));
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "Condition 5 applies."}}]
    }))
}

async fn rejected() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"message": "invalid api key"}})),
    )
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings(addr: SocketAddr) -> NvidiaSettings {
    NvidiaSettings {
        api_key: Some("nvapi-test".to_string()),
        base_url: format!("http://{addr}/v1/"),
        ..NvidiaSettings::default()
    }
}

#[tokio::test]
async fn speaks_the_openai_compatible_protocol() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/chat/completions", post(completions))
        .with_state(recorded.clone());
    let client = NvidiaClient::from_settings(&settings(spawn(app).await)).unwrap();

    let passages = client
        .embed_passages(&["first".to_string(), "second".to_string(), "third".to_string()])
        .await
        .unwrap();
    assert_eq!(passages, vec![vec![0.0, 1.0], vec![1.0, 1.0], vec![2.0, 1.0]]);

    let query = client.embed_query("What is Condition 5?").await.unwrap();
    assert_eq!(query, vec![0.0, 1.0]);

    let answer = client.complete("prompt text").await.unwrap();
    assert_eq!(answer, "Condition 5 applies.");

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    for (_, auth, _) in requests.iter() {
        assert_eq!(auth.as_deref(), Some("Bearer nvapi-test"));
    }

    let (_, _, passage_body) = &requests[0];
    assert_eq!(passage_body["model"], json!("nvidia/nv-embedqa-e5-v5"));
    assert_eq!(passage_body["input_type"], json!("passage"));
    assert_eq!(passage_body["truncate"], json!("END"));
    assert_eq!(passage_body["encoding_format"], json!("float"));

    let (_, _, query_body) = &requests[1];
    assert_eq!(query_body["input_type"], json!("query"));
    assert_eq!(query_body["input"], json!(["What is Condition 5?"]));

    let (kind, _, chat_body) = &requests[2];
    assert_eq!(kind, "chat");
    assert_eq!(chat_body["model"], json!("microsoft/phi-4-mini-instruct"));
    assert_eq!(
        chat_body["messages"],
        json!([{"role": "user", "content": "prompt text"}])
    );
    assert_eq!(chat_body["temperature"], json!(0.0));
    assert_eq!(chat_body["max_tokens"], json!(1024));
    assert_eq!(chat_body["stream"], json!(false));
}

#[tokio::test]
async fn api_errors_surface_as_upstream_failures() {
    let app = Router::new()
        .route("/v1/embeddings", post(rejected))
        .route("/v1/chat/completions", post(rejected));
    let client = NvidiaClient::from_settings(&settings(spawn(app).await)).unwrap();

    let err = client.embed_query("question").await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(ref msg) if msg.contains("invalid api key")));

    let err = client.complete("prompt").await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(ref msg) if msg.contains("401")));
}
