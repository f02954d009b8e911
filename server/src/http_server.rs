use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use zoey_core::ChatCompletion;
use zoey_dialogue::shop::ProductSearch;
use zoey_dialogue::store::{ActivityEntry, ActivityStoreRef, StoredFile};
use zoey_dialogue::{ConversationTurn, Mode, Payload};

use crate::config::AppConfig;
use crate::coordinator::{self, ChatRequest, CoordinatorError, ImageAttachment, Reply, Services};

/// Response header carrying the flow step the conversation is left in
pub const FLOW_STEP_HEADER: &str = "x-zoey-flow-step";

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    services: Services,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        llm: Arc<dyn ChatCompletion>,
        products: Option<Arc<dyn ProductSearch>>,
        store: ActivityStoreRef,
    ) -> Self {
        Self {
            services: Services {
                config: Arc::new(config),
                llm,
                products,
                store,
            },
        }
    }
}

/// JSON body of `/api/chat`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    history: Vec<ConversationTurn>,
    #[serde(default)]
    flow_step: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeInfo {
    id: Mode,
    welcome_message: &'static str,
    chat_like: bool,
}

#[derive(Serialize)]
pub struct MemoryResponse {
    activity: Vec<ActivityEntry>,
    files: Vec<StoredFile>,
}

/// Error type for HTTP server
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl From<CoordinatorError> for ApiError {
    fn from(e: CoordinatorError) -> Self {
        ApiError::InternalError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => {
                warn!(error = %message, "Rejected request");
                (StatusCode::BAD_REQUEST, message)
            }
            Self::InternalError(message) => {
                error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the router with all routes and the CORS layer
pub fn router(state: AppState) -> Router {
    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(FLOW_STEP_HEADER)]);

    Router::new()
        .route("/", get(health))
        .route("/api/chat", post(handle_chat))
        .route("/api/modes", get(list_modes))
        .route("/api/streak", get(get_streak))
        .route("/api/memory", get(get_memory))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.services.config.http_addr;
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "Zoey is running"
}

async fn list_modes() -> Json<Vec<ModeInfo>> {
    Json(
        Mode::ALL
            .into_iter()
            .map(|mode| ModeInfo {
                id: mode,
                welcome_message: mode.persona().welcome_message,
                chat_like: mode.is_chat_like(),
            })
            .collect(),
    )
}

async fn get_streak(State(state): State<AppState>) -> Result<Json<Payload>, ApiError> {
    let streak = state
        .services
        .store
        .streak()
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to load streak: {}", e)))?;
    Ok(Json(Payload::Streak(streak)))
}

async fn get_memory(State(state): State<AppState>) -> Result<Json<MemoryResponse>, ApiError> {
    let store = &state.services.store;
    let activity = store
        .activity()
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to load activity: {}", e)))?;
    let files = store
        .files()
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to load files: {}", e)))?;
    Ok(Json(MemoryResponse { activity, files }))
}

/// Handler for chat requests, JSON or multipart
async fn handle_chat(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let chat_request = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        decode_multipart(multipart).await?
    } else {
        let Json(body) = Json::<ChatBody>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        validate(body.message, body.mode, body.history, body.flow_step, None)?
    };

    let reply = coordinator::process_chat(&state.services, chat_request).await?;
    Ok(into_response(reply))
}

async fn decode_multipart(mut multipart: Multipart) -> Result<ChatRequest, ApiError> {
    let mut message = None;
    let mut mode = None;
    let mut history = Vec::new();
    let mut flow_step = None;
    let mut image = None;

    let bad_field = |e: axum::extract::multipart::MultipartError| {
        ApiError::BadRequest(format!("Invalid form data: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_field)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => message = Some(field.text().await.map_err(bad_field)?),
            "mode" => mode = Some(field.text().await.map_err(bad_field)?),
            "flowStep" => flow_step = Some(field.text().await.map_err(bad_field)?),
            "history" => {
                let raw = field.text().await.map_err(bad_field)?;
                if !raw.trim().is_empty() {
                    history = serde_json::from_str(&raw)
                        .map_err(|e| ApiError::BadRequest(format!("Invalid history: {}", e)))?;
                }
            }
            "file" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                if !bytes.is_empty() {
                    image = Some(ImageAttachment {
                        mime_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => warn!(field = %other, "Ignoring unknown form field"),
        }
    }

    validate(message, mode, history, flow_step, image)
}

fn validate(
    message: Option<String>,
    mode: Option<String>,
    history: Vec<ConversationTurn>,
    flow_step: Option<String>,
    image: Option<ImageAttachment>,
) -> Result<ChatRequest, ApiError> {
    let message = message.unwrap_or_default();
    if message.trim().is_empty() && image.is_none() {
        return Err(ApiError::BadRequest("Message or file is required".to_string()));
    }

    let mode = mode
        .unwrap_or_default()
        .parse::<Mode>()
        .map_err(|_| ApiError::BadRequest("Invalid mode".to_string()))?;

    Ok(ChatRequest {
        message,
        mode,
        history,
        flow_step: flow_step.filter(|step| !step.trim().is_empty()),
        image,
    })
}

fn into_response(reply: Reply) -> Response {
    match reply {
        Reply::Text { text, step } => {
            let mut response = ([(CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response();
            if let Some(step) = step {
                response
                    .headers_mut()
                    .insert(FLOW_STEP_HEADER, HeaderValue::from_static(step.id()));
            }
            response
        }
        Reply::Payload(payload) => Json(payload).into_response(),
        Reply::Stream { stream, chat_like } => {
            let content_type = if chat_like {
                "text/event-stream"
            } else {
                "text/plain; charset=utf-8"
            };
            (
                [(CONTENT_TYPE, content_type), (CACHE_CONTROL, "no-cache")],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_message_or_file() {
        let err = validate(Some("  ".to_string()), Some("bff".to_string()), vec![], None, None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Message or file is required"));

        let image = ImageAttachment {
            mime_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        };
        let request = validate(None, Some("coach".to_string()), vec![], None, Some(image)).unwrap();
        assert_eq!(request.mode, Mode::Coach);
        assert!(request.message.is_empty());
    }

    #[test]
    fn test_validate_mode() {
        let err = validate(Some("hi".to_string()), Some("wizard".to_string()), vec![], None, None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Invalid mode"));

        let err = validate(Some("hi".to_string()), None, vec![], None, None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_blank_flow_step_is_dropped() {
        let request = validate(
            Some("hi".to_string()),
            Some("manager".to_string()),
            vec![],
            Some(" ".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(request.flow_step, None);
    }
}
