use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use pdfqa_core::error::ServiceError;
use pdfqa_core::traits::Embedder;
use pdfqa_embed::OllamaEmbedder;
use serde_json::{json, Value};

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

async fn embed_ok(Json(body): Json<Value>) -> Json<Value> {
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let embeddings: Vec<Vec<f32>> = inputs.iter().enumerate().map(|(i, _)| vec![i as f32, 1.0, 0.5]).collect();
    Json(json!({ "model": body["model"], "embeddings": embeddings }))
}

#[tokio::test]
async fn embeds_batch_in_order() {
    let url = spawn_mock(Router::new().route("/api/embed", post(embed_ok))).await;
    let embedder = OllamaEmbedder::new(&url, "nomic-embed-text", Duration::from_secs(5)).unwrap();
    let vectors = embedder.embed_batch(&["a".to_string(), "b".to_string()]).await.unwrap();
    assert_eq!(vectors, vec![vec![0.0, 1.0, 0.5], vec![1.0, 1.0, 0.5]]);
    assert_eq!(embedder.embed("single").await.unwrap().len(), 3);
    assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_model_is_misconfigured() {
    let router = Router::new().route(
        "/api/embed",
        post(|| async { (StatusCode::NOT_FOUND, Json(json!({ "error": "model \"missing\" not found, try pulling it first" }))) }),
    );
    let url = spawn_mock(router).await;
    let embedder = OllamaEmbedder::new(&url, "missing", Duration::from_secs(5)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ServiceError>(), Some(ServiceError::Misconfigured(_))));
}

#[tokio::test]
async fn count_mismatch_is_corrupt() {
    let router = Router::new().route("/api/embed", post(|| async { Json(json!({ "embeddings": [] })) }));
    let url = spawn_mock(router).await;
    let embedder = OllamaEmbedder::new(&url, "nomic-embed-text", Duration::from_secs(5)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ServiceError>(), Some(ServiceError::Corrupt(_))));
}

#[tokio::test]
async fn refused_connection_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let embedder = OllamaEmbedder::new(&format!("http://{addr}"), "nomic-embed-text", Duration::from_secs(2)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ServiceError>(), Some(ServiceError::Unavailable(_))));
}

#[tokio::test]
async fn slow_server_times_out() {
    let router = Router::new().route(
        "/api/embed",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "embeddings": [[1.0]] }))
        }),
    );
    let url = spawn_mock(router).await;
    let embedder = OllamaEmbedder::new(&url, "nomic-embed-text", Duration::from_millis(200)).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ServiceError>(), Some(ServiceError::Unavailable(_))));
}
