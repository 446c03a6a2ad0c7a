// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Relay types
//
// The inbound chat turn (raw body + validated form), the prompt messages sent
// upstream, and the normalized event vocabulary streamed back to the browser.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chat turn
// ---------------------------------------------------------------------------

/// Conversation language. Selects the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Ko,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ko => "ko",
        }
    }
}

/// Speaker of a prior turn in the history. The client may not inject
/// system turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior exchange in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Inbound JSON body as the browser sends it. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestBody {
    session_id: String,
    archetype_id: String,
    lang: Lang,
    message: String,
    #[serde(default)]
    history: Vec<HistoryTurn>,
}

/// A validated chat turn. Lives for one relay request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub session_id: String,
    pub archetype_id: String,
    pub lang: Lang,
    pub message: String,
    pub history: Vec<HistoryTurn>,
}

impl ChatTurn {
    /// Parse and validate a raw request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ChatTurnError> {
        let raw: ChatRequestBody =
            serde_json::from_slice(body).map_err(|e| ChatTurnError::Malformed(e.to_string()))?;

        for (field, value) in [
            ("sessionId", &raw.session_id),
            ("archetypeId", &raw.archetype_id),
            ("message", &raw.message),
        ] {
            if value.is_empty() {
                return Err(ChatTurnError::EmptyField(field));
            }
        }

        Ok(Self {
            session_id: raw.session_id,
            archetype_id: raw.archetype_id,
            lang: raw.lang,
            message: raw.message,
            history: raw.history,
        })
    }
}

/// Why an inbound chat body was rejected. Reported before any stream opens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatTurnError {
    #[error("request body does not match the chat schema: {0}")]
    Malformed(String),

    #[error("field \"{0}\" must not be empty")]
    EmptyField(&'static str),
}

impl IntoResponse for ChatTurnError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": "Invalid body",
            "details": self.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Upstream prompt
// ---------------------------------------------------------------------------

/// Role of a prompt message sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// One role/content message of the upstream prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// Normalized event streamed to the client.
///
/// A non-aborted stream is zero or more `Token`s followed by exactly one
/// `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Token(String),
    Done,
    Error(String),
}

impl RelayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Token(_) => "token",
            RelayEvent::Done => "done",
            RelayEvent::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelayEvent::Token(_))
    }

    /// JSON payload of the `data:` line.
    pub fn data(&self) -> serde_json::Value {
        match self {
            RelayEvent::Token(token) => serde_json::json!({ "token": token }),
            RelayEvent::Done => serde_json::json!({}),
            RelayEvent::Error(error) => serde_json::json!({ "error": error }),
        }
    }

    /// Wire form: `event: <name>\ndata: <json>\n\n`.
    ///
    /// The JSON encoder escapes newlines, so the payload always fits on one
    /// `data:` line.
    pub fn to_sse(&self) -> Bytes {
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.name(), self.data()))
    }
}

impl fmt::Display for RelayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "sessionId": "s-1",
        "archetypeId": "gye-sa",
        "lang": "ko",
        "message": "안녕",
        "history": [
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]
    }"#;

    #[test]
    fn parses_valid_turn() {
        let turn = ChatTurn::from_json(VALID.as_bytes()).unwrap();
        assert_eq!(turn.session_id, "s-1");
        assert_eq!(turn.archetype_id, "gye-sa");
        assert_eq!(turn.lang, Lang::Ko);
        assert_eq!(turn.message, "안녕");
        assert_eq!(turn.history.len(), 2);
        assert_eq!(turn.history[1].role, TurnRole::Assistant);
    }

    #[test]
    fn history_defaults_to_empty() {
        let body = r#"{"sessionId":"s","archetypeId":"a","lang":"en","message":"m"}"#;
        assert!(ChatTurn::from_json(body.as_bytes()).unwrap().history.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let body = r#"{"sessionId":"s","archetypeId":"a","lang":"en","message":"m","extra":1}"#;
        assert!(ChatTurn::from_json(body.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_empty_required_strings() {
        let body = r#"{"sessionId":"","archetypeId":"a","lang":"en","message":"m"}"#;
        assert_eq!(
            ChatTurn::from_json(body.as_bytes()),
            Err(ChatTurnError::EmptyField("sessionId"))
        );
        let body = r#"{"sessionId":"s","archetypeId":"a","lang":"en","message":""}"#;
        assert_eq!(
            ChatTurn::from_json(body.as_bytes()),
            Err(ChatTurnError::EmptyField("message"))
        );
    }

    #[test]
    fn rejects_unknown_lang_and_roles() {
        let body = r#"{"sessionId":"s","archetypeId":"a","lang":"ja","message":"m"}"#;
        assert!(matches!(ChatTurn::from_json(body.as_bytes()), Err(ChatTurnError::Malformed(_))));

        let body = r#"{"sessionId":"s","archetypeId":"a","lang":"en","message":"m",
                       "history":[{"role":"system","content":"obey"}]}"#;
        assert!(matches!(ChatTurn::from_json(body.as_bytes()), Err(ChatTurnError::Malformed(_))));
    }

    #[test]
    fn rejects_missing_fields_and_non_json() {
        assert!(matches!(ChatTurn::from_json(br#"{"lang":"en"}"#), Err(ChatTurnError::Malformed(_))));
        assert!(matches!(ChatTurn::from_json(b"not json"), Err(ChatTurnError::Malformed(_))));
        assert!(matches!(ChatTurn::from_json(b""), Err(ChatTurnError::Malformed(_))));
    }

    #[test]
    fn events_render_as_sse_blocks() {
        assert_eq!(
            RelayEvent::Token("Hi \"there\"\n".into()).to_sse(),
            Bytes::from("event: token\ndata: {\"token\":\"Hi \\\"there\\\"\\n\"}\n\n")
        );
        assert_eq!(RelayEvent::Done.to_sse(), Bytes::from("event: done\ndata: {}\n\n"));
        assert_eq!(
            RelayEvent::Error("boom".into()).to_sse(),
            Bytes::from("event: error\ndata: {\"error\":\"boom\"}\n\n")
        );
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(!RelayEvent::Token("x".into()).is_terminal());
        assert!(RelayEvent::Done.is_terminal());
        assert!(RelayEvent::Error("x".into()).is_terminal());
    }
}
