//! Chat API surface: `{user_id, message}` in, `{text, mood}` out.

use serde::{Deserialize, Serialize};

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Stable user identifier.
    pub user_id: String,
    /// Raw message text.
    pub message: String,
}

impl ChatRequest {
    /// Build a request.
    #[must_use]
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

/// How the reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Normal generated reply (or the failure placeholder).
    Awake,
    /// Refused: sleeping or exhausted.
    Asleep,
    /// Refused: the user is disliked.
    Hostile,
    /// Command acknowledgment, no generation.
    Neutral,
}

/// The reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply text.
    pub text: String,
    /// Reply mood.
    pub mood: Mood,
}

impl ChatResponse {
    pub(crate) fn new(text: impl Into<String>, mood: Mood) -> Self {
        Self {
            text: text.into(),
            mood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_serializes_lowercase() {
        let r = ChatResponse::new("Zzz", Mood::Asleep);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["mood"], "asleep");
        let back: ChatResponse = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn request_from_json() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"user_id": "u1", "message": "Hello"}"#).unwrap();
        assert_eq!(req, ChatRequest::new("u1", "Hello"));
    }
}
