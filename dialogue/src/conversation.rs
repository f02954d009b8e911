//! Conversation history as sent by the client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zoey_core::ChatMessage;

use crate::plans::{Schedule, TaskList, WorkoutPlan};
use crate::shop::ShopData;
use crate::store::StreakData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Structured reply the client renders as a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Workout(WorkoutPlan),
    Schedule(Schedule),
    Tasks(TaskList),
    Streak(StreakData),
    Products(ShopData),
}

/// Content of a turn, decided once at deserialization
///
/// Anything that is neither a string nor a known payload is kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Payload(Payload),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: TurnContent,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Plain text of the turn, `None` for structured content
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Message for the completion endpoint; structured content is sent as JSON text
    pub fn to_chat_message(&self) -> ChatMessage {
        let content = match &self.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Payload(payload) => serde_json::to_string(payload).unwrap_or_default(),
            TurnContent::Other(value) => value.to_string(),
        };

        match self.role {
            TurnRole::User => ChatMessage::user(content),
            TurnRole::Assistant => ChatMessage::assistant(content),
        }
    }
}

/// Text of the most recent assistant turn
///
/// Returns `None` when there is no assistant turn or the latest one is structured.
pub fn last_assistant_text(history: &[ConversationTurn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|turn| turn.role == TurnRole::Assistant)
        .and_then(ConversationTurn::text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_turn() {
        let turn: ConversationTurn = serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
        assert_eq!(turn, ConversationTurn::user("hi"));
    }

    #[test]
    fn test_known_payload_turn() {
        let turn: ConversationTurn = serde_json::from_value(json!({
            "role": "assistant",
            "content": {
                "type": "streak",
                "data": {
                    "currentStreak": 7,
                    "longestStreak": 14,
                    "lastActive": "2026-10-18T10:00:00Z",
                    "streakStartDate": "2026-10-11T10:00:00Z",
                    "totalDays": 21,
                    "milestones": {"nextMilestone": 14, "progress": 50}
                }
            }
        }))
        .unwrap();

        assert!(matches!(turn.content, TurnContent::Payload(Payload::Streak(ref s)) if s.current_streak == 7));
        assert_eq!(turn.text(), None);
    }

    #[test]
    fn test_unknown_content_is_opaque() {
        let turn: ConversationTurn = serde_json::from_value(json!({
            "role": "assistant",
            "content": {"type": "weather", "data": {"temp": 21}}
        }))
        .unwrap();
        assert!(matches!(turn.content, TurnContent::Other(_)));

        let message = turn.to_chat_message();
        assert_eq!(message.text(), Some(r#"{"data":{"temp":21},"type":"weather"}"#));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<ConversationTurn>(json!({"role": "system", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_last_assistant_text() {
        let history = vec![
            ConversationTurn::assistant("first"),
            ConversationTurn::user("answer"),
            ConversationTurn::assistant("second"),
            ConversationTurn::user("another answer"),
        ];
        assert_eq!(last_assistant_text(&history), Some("second"));
        assert_eq!(last_assistant_text(&history[..2]), Some("first"));
        assert_eq!(last_assistant_text(&[]), None);
        assert_eq!(last_assistant_text(&[ConversationTurn::user("only me")]), None);
    }
}
