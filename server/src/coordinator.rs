use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;
use zoey_core::{ChatCompletion, ChatCompletionRequest, ChatMessage, TextStream, ZoeyError};
use zoey_dialogue::chunker::{bubble_stream, Pacing};
use zoey_dialogue::flow::{engage, PlanRequest, Transition};
use zoey_dialogue::generator::{PlanGenerator, ReplyBody};
use zoey_dialogue::intent::{self, Intent};
use zoey_dialogue::shop::{search_products, ProductSearch};
use zoey_dialogue::store::ActivityStoreRef;
use zoey_dialogue::{ConversationTurn, DialogueError, Flow, FlowStep, Mode, Payload};

use crate::config::AppConfig;

/// How many history turns accompany an image
const IMAGE_HISTORY_TURNS: usize = 5;

const DEFAULT_IMAGE_PROMPT: &str = "What do you see in this image?";

/// Image uploaded alongside a message
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// One decoded `/api/chat` request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub mode: Mode,
    pub history: Vec<ConversationTurn>,
    pub flow_step: Option<String>,
    pub image: Option<ImageAttachment>,
}

/// What the handler sends back
pub enum Reply {
    Text { text: String, step: Option<FlowStep> },
    Payload(Payload),
    Stream { stream: TextStream, chat_like: bool },
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Text { text, step } => f
                .debug_struct("Text")
                .field("text", text)
                .field("step", step)
                .finish(),
            Reply::Payload(payload) => f.debug_tuple("Payload").field(payload).finish(),
            Reply::Stream { chat_like, .. } => f
                .debug_struct("Stream")
                .field("chat_like", chat_like)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Failed to process image: {0}")]
    Image(#[source] ZoeyError),

    #[error("Failed to get response")]
    Chat(#[source] ZoeyError),

    #[error("Failed to load activity: {0}")]
    Storage(#[source] DialogueError),
}

/// Collaborators a chat request may need
#[derive(Clone)]
pub struct Services {
    pub config: Arc<AppConfig>,
    pub llm: Arc<dyn ChatCompletion>,
    pub products: Option<Arc<dyn ProductSearch>>,
    pub store: ActivityStoreRef,
}

/// Process a single chat request
///
/// Checked in order: attached image, streak question, the persona's scripted
/// flow, product search for the shopper, then free chat with the persona.
pub async fn process_chat(services: &Services, request: ChatRequest) -> Result<Reply, CoordinatorError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, mode = %request.mode);

    async move {
        let intent = intent::classify(&request.message);
        debug!(
            history = request.history.len(),
            image = request.image.is_some(),
            intent = ?intent,
            "Processing chat request"
        );

        if let Some(image) = &request.image {
            return describe_image(services, &request, image).await;
        }

        if intent == Intent::Streak {
            info!("Serving streak");
            let streak = services.store.streak().await.map_err(CoordinatorError::Storage)?;
            return Ok(Reply::Payload(Payload::Streak(streak)));
        }

        if let Some(flow) = Flow::for_mode(request.mode) {
            if let Some(transition) = flow_transition(flow, &request) {
                info!(flow = %flow, "Continuing scripted flow");
                let generator = PlanGenerator::new(
                    services.llm.clone(),
                    services.config.model.clone(),
                    services.config.temperature,
                );
                let reply = generator.respond(transition).await;
                return Ok(match reply.body {
                    ReplyBody::Text(text) => Reply::Text {
                        text,
                        step: reply.step,
                    },
                    ReplyBody::Payload(payload) => Reply::Payload(payload),
                });
            }
        }

        if request.mode == Mode::Shopper && intent::is_shop_request(&request.message) {
            info!("Searching products");
            let data = search_products(services.products.as_deref(), &request.message).await;
            return Ok(Reply::Payload(Payload::Products(data)));
        }

        chat(services, &request).await
    }
    .instrument(span)
    .await
}

fn flow_transition(flow: Flow, request: &ChatRequest) -> Option<Transition> {
    // "What's on my schedule" is answered right away
    if flow == Flow::Manager && intent::is_direct_schedule_query(&request.message) {
        return Some(Transition::Generate(PlanRequest::TodaySchedule));
    }

    engage(
        flow,
        &request.message,
        &request.history,
        request.flow_step.as_deref(),
    )
}

async fn describe_image(
    services: &Services,
    request: &ChatRequest,
    image: &ImageAttachment,
) -> Result<Reply, CoordinatorError> {
    info!(mime_type = %image.mime_type, size = image.bytes.len(), "Describing image");

    let text = if request.message.trim().is_empty() {
        DEFAULT_IMAGE_PROMPT
    } else {
        request.message.as_str()
    };

    let recent = request.history.len().saturating_sub(IMAGE_HISTORY_TURNS);
    let mut messages = vec![ChatMessage::system(request.mode.image_system_prompt())];
    messages.extend(request.history[recent..].iter().map(ConversationTurn::to_chat_message));
    messages.push(ChatMessage::user_with_image(text, image.data_url()));

    let completion = ChatCompletionRequest::new(services.config.vision_model.clone(), messages)
        .with_max_tokens(services.config.max_tokens);

    match services.llm.complete(completion).await {
        Ok(text) => Ok(Reply::Text { text, step: None }),
        Err(e) => {
            error!(error = %e, "Image description failed");
            Err(CoordinatorError::Image(e))
        }
    }
}

async fn chat(services: &Services, request: &ChatRequest) -> Result<Reply, CoordinatorError> {
    let chat_like = request.mode.is_chat_like();

    let mut messages = vec![ChatMessage::system(request.mode.system_prompt())];
    messages.extend(request.history.iter().map(ConversationTurn::to_chat_message));
    messages.push(ChatMessage::user(request.message.clone()));

    let completion = ChatCompletionRequest::new(services.config.model.clone(), messages)
        .with_temperature(services.config.temperature)
        .with_max_tokens(services.config.max_tokens);

    let fragments = match services.llm.stream(completion).await {
        Ok(fragments) => fragments,
        Err(e) => {
            error!(error = %e, "Chat completion failed");
            return Err(CoordinatorError::Chat(e));
        }
    };

    let stream = if chat_like {
        bubble_stream(fragments, Pacing::default())
    } else {
        fragments
    };

    Ok(Reply::Stream { stream, chat_like })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = ImageAttachment {
            mime_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_direct_query_skips_flow() {
        let request = ChatRequest {
            message: "what's on my schedule today".to_string(),
            mode: Mode::Manager,
            history: vec![],
            flow_step: Some("manager.scheduleType".to_string()),
            image: None,
        };
        assert_eq!(
            flow_transition(Flow::Manager, &request),
            Some(Transition::Generate(PlanRequest::TodaySchedule))
        );
    }
}
