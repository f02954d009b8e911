use std::net::SocketAddr;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use zoey_core::{
    ChatCompletion, ChatCompletionRequest, ChatMessage, CompletionClient, Provider, ZoeyConfig,
    ZoeyError,
};

const SSE_BODY: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\" there 😊\"}}]}\n\n",
    "data: [DONE]\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
);

/// Minimal OpenAI-compatible endpoint
async fn completions(Json(body): Json<Value>) -> axum::response::Response {
    if body["model"] == "broken" {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }

    if body["model"] == "garbled" {
        return "not json".into_response();
    }

    if body["stream"] == true {
        return ([("content-type", "text/event-stream")], SSE_BODY).into_response();
    }

    let last = body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|message| message["content"].as_str())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": format!("echo: {}", last) } }]
    }))
    .into_response()
}

async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/chat/completions", post(completions));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> CompletionClient {
    let config = ZoeyConfig {
        provider: Some(Provider::Gaia),
        base_url: Some(format!("http://{}/v1/", addr)),
        timeout_secs: Some(5),
        ..Default::default()
    };
    CompletionClient::new(&config).unwrap()
}

fn request(model: &str, text: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(model, vec![ChatMessage::system("be brief"), ChatMessage::user(text)])
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let client = client_for(spawn_upstream().await);
    let text = client.complete(request("llama", "hi")).await.unwrap();
    assert_eq!(text, "echo: hi");
}

#[tokio::test]
async fn test_stream_yields_deltas_until_done() {
    let client = client_for(spawn_upstream().await);
    let fragments: Vec<String> = client
        .stream(request("llama", "hi"))
        .await
        .unwrap()
        .map(|fragment| fragment.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Hello", " there 😊"]);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let client = client_for(spawn_upstream().await);
    let err = client.complete(request("broken", "hi")).await.unwrap_err();
    match err {
        ZoeyError::HttpError {
            status_code,
            message,
        } => {
            assert_eq!(status_code, 401);
            assert!(message.contains("bad key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_body_is_parsing_error() {
    let client = client_for(spawn_upstream().await);
    let err = client.complete(request("garbled", "hi")).await.unwrap_err();
    assert!(matches!(err, ZoeyError::ParsingError(_)), "{:?}", err);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_request_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr);
    let err = client.complete(request("llama", "hi")).await.unwrap_err();
    assert!(matches!(err, ZoeyError::RequestError(_)), "{:?}", err);
}
