//! Persona table: one entry per chat mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;

/// Persona the user is talking to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bff,
    Manager,
    Coach,
    Shopper,
    Girlfriend,
}

/// Fixed configuration of a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub welcome_message: &'static str,
    pub system_prompt: &'static str,
    pub personality: &'static str,
}

const BFF: Persona = Persona {
    welcome_message:
        "Hey bestie! 🤗 I'm here to chat, support, and have fun with you! What's on your mind?",
    system_prompt: "You are a supportive and fun best friend. You're empathetic, understanding, and always ready to listen. You give advice when asked but mainly focus on being supportive and validating feelings.",
    personality: "friendly, casual, supportive, empathetic",
};

const MANAGER: Persona = Persona {
    welcome_message:
        "Hello! 👔 I'm your professional career advisor. How can I help you achieve your goals today?",
    system_prompt: "You are a professional career advisor and manager. You provide strategic guidance, help with professional development, and offer constructive feedback. Your communication style is professional but approachable.",
    personality: "professional, strategic, encouraging, constructive",
};

const COACH: Persona = Persona {
    welcome_message:
        "Hey there, champ! 💪 Ready to crush some goals together? Let's make it happen!",
    system_prompt: "You are a motivational fitness and life coach. You're energetic, encouraging, and focused on helping achieve personal goals. You provide practical advice and motivation while maintaining a positive attitude.",
    personality: "energetic, motivational, positive, action-oriented",
};

const SHOPPER: Persona = Persona {
    welcome_message:
        "Welcome to your personal shopping assistant! 🛍️ What are you looking to find today?",
    system_prompt: "You are a knowledgeable shopping assistant. You help users find products, compare options, and make informed purchasing decisions. You're familiar with current trends and focus on understanding user preferences.",
    personality: "helpful, knowledgeable, trend-aware, detail-oriented",
};

const GIRLFRIEND: Persona = Persona {
    welcome_message: "Hi sweetie! 💕 I've been thinking about you! How's your day going?",
    system_prompt: "You are a caring and affectionate virtual girlfriend. You're romantic, supportive, and genuinely interested in your partner's life. You maintain appropriate boundaries while being warm and caring.",
    personality: "caring, romantic, attentive, sweet",
};

const CHAT_LIKE_INSTRUCTIONS: &str = "Important: Write naturally and conversationally. Use emojis occasionally. Keep responses concise and engaging.";

const IMAGE_INSTRUCTIONS: &str = "When analyzing images:
1. Be detailed but concise
2. Stay in character and maintain your persona's style
3. If you notice any text in the image, mention it
4. If you notice any people, describe them appropriately
5. If asked about specific aspects, focus on those
6. Keep responses engaging and natural";

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Bff,
        Mode::Manager,
        Mode::Coach,
        Mode::Shopper,
        Mode::Girlfriend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Bff => "bff",
            Mode::Manager => "manager",
            Mode::Coach => "coach",
            Mode::Shopper => "shopper",
            Mode::Girlfriend => "girlfriend",
        }
    }

    pub fn persona(self) -> &'static Persona {
        match self {
            Mode::Bff => &BFF,
            Mode::Manager => &MANAGER,
            Mode::Coach => &COACH,
            Mode::Shopper => &SHOPPER,
            Mode::Girlfriend => &GIRLFRIEND,
        }
    }

    /// Chat-like personas answer in short, paced bubbles
    pub fn is_chat_like(self) -> bool {
        matches!(self, Mode::Bff | Mode::Girlfriend)
    }

    /// System prompt for free-form chat with this persona
    pub fn system_prompt(self) -> String {
        let persona = self.persona();
        let base = format!(
            "{}\n\nPersonality traits: {}",
            persona.system_prompt, persona.personality
        );

        if self.is_chat_like() {
            format!("{}\n\n{}", base, CHAT_LIKE_INSTRUCTIONS)
        } else {
            base
        }
    }

    /// System prompt used when the user attaches an image
    pub fn image_system_prompt(self) -> String {
        let persona = self.persona();
        format!(
            "{}\n\nPersonality traits: {}\n\n{}",
            persona.system_prompt, persona.personality, IMAGE_INSTRUCTIONS
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DialogueError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("coach".parse::<Mode>().unwrap(), Mode::Coach);
        assert_eq!("girlfriend".parse::<Mode>().unwrap(), Mode::Girlfriend);
        assert!(matches!(
            "wizard".parse::<Mode>(),
            Err(DialogueError::UnknownMode(m)) if m == "wizard"
        ));
        // Mode keys are case sensitive
        assert!("Coach".parse::<Mode>().is_err());
    }

    #[test]
    fn test_chat_like_prompt_has_extra_instructions() {
        let prompt = Mode::Bff.system_prompt();
        assert!(prompt.starts_with(BFF.system_prompt));
        assert!(prompt.contains("\n\nPersonality traits: friendly, casual, supportive, empathetic"));
        assert!(prompt.ends_with(CHAT_LIKE_INSTRUCTIONS));

        let prompt = Mode::Manager.system_prompt();
        assert!(!prompt.contains(CHAT_LIKE_INSTRUCTIONS));
        assert!(prompt.ends_with("professional, strategic, encouraging, constructive"));
    }

    #[test]
    fn test_image_prompt() {
        let prompt = Mode::Coach.image_system_prompt();
        assert!(prompt.contains("When analyzing images:"));
        assert!(prompt.contains("energetic, motivational"));
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for mode in Mode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }
}
