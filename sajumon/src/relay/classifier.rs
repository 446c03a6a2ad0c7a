// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Frame classifiers
//
// Decide what each parsed upstream JSON frame means for the client: a text
// delta to forward, the end of the answer, an upstream failure, or noise.
//
// Two implementations: the Responses event stream and the chat-completions
// chunk stream, selected by `upstream.wire`.

use std::sync::Arc;

use serde_json::Value;

use crate::config::WireFormat;

/// Fallback text when a failure frame carries no message.
pub const GENERIC_UPSTREAM_ERROR: &str = "upstream error";

/// Classification of one upstream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// Non-empty text to forward verbatim.
    TextDelta(String),
    /// The answer is complete.
    Completed,
    /// The upstream reported a failure.
    Failed(String),
    /// Anything else (lifecycle events, role-only deltas, unknown types).
    Ignored,
}

/// Maps provider-specific frames to a `FrameKind`.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &Value) -> FrameKind;
}

/// Classifier for the configured wire format.
pub fn classifier_for(wire: WireFormat) -> Arc<dyn FrameClassifier> {
    match wire {
        WireFormat::Responses => Arc::new(ResponsesClassifier),
        WireFormat::ChatCompletions => Arc::new(ChatCompletionsClassifier),
    }
}

/// Pull a human-readable message out of an error-bearing frame.
///
/// Looks at `error.message`, then `response.error.message`, then a
/// top-level `message`.
pub fn upstream_error_message(frame: &Value) -> String {
    [
        frame.pointer("/error/message"),
        frame.pointer("/response/error/message"),
        frame.get("message"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|m| !m.is_empty())
    .unwrap_or(GENERIC_UPSTREAM_ERROR)
    .to_string()
}

// ---------------------------------------------------------------------------
// Responses stream
// ---------------------------------------------------------------------------

/// Classifies Responses-style events, keyed by the frame's `type`:
/// - `response.output_text.delta` with non-empty `delta` -> TextDelta
/// - `response.completed` -> Completed
/// - `response.failed`, `error` -> Failed
/// - everything else (`response.created`, `response.output_item.added`, ...) -> Ignored
pub struct ResponsesClassifier;

impl FrameClassifier for ResponsesClassifier {
    fn classify(&self, frame: &Value) -> FrameKind {
        match frame.get("type").and_then(Value::as_str).unwrap_or("") {
            "response.output_text.delta" => match frame.get("delta").and_then(Value::as_str) {
                Some(delta) if !delta.is_empty() => FrameKind::TextDelta(delta.to_string()),
                _ => FrameKind::Ignored,
            },
            "response.completed" => FrameKind::Completed,
            "response.failed" | "error" => FrameKind::Failed(upstream_error_message(frame)),
            _ => FrameKind::Ignored,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat-completions stream
// ---------------------------------------------------------------------------

/// Classifies chat-completions chunks:
/// - `choices[0].delta.content` non-empty -> TextDelta
/// - top-level `error` -> Failed
/// - `choices[0].finish_reason` set -> Completed
/// - role-only deltas, usage chunks -> Ignored
pub struct ChatCompletionsClassifier;

impl FrameClassifier for ChatCompletionsClassifier {
    fn classify(&self, frame: &Value) -> FrameKind {
        let choice = frame.pointer("/choices/0");

        if let Some(content) = choice
            .and_then(|c| c.pointer("/delta/content"))
            .and_then(Value::as_str)
        {
            if !content.is_empty() {
                return FrameKind::TextDelta(content.to_string());
            }
        }

        if frame.get("error").is_some_and(|e| !e.is_null()) {
            return FrameKind::Failed(upstream_error_message(frame));
        }

        if choice
            .and_then(|c| c.get("finish_reason"))
            .and_then(Value::as_str)
            .is_some()
        {
            return FrameKind::Completed;
        }

        FrameKind::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn responses_text_delta() {
        let frame = json!({"type": "response.output_text.delta", "delta": "Hel"});
        assert_eq!(ResponsesClassifier.classify(&frame), FrameKind::TextDelta("Hel".into()));
    }

    #[test]
    fn responses_empty_delta_ignored() {
        let frame = json!({"type": "response.output_text.delta", "delta": ""});
        assert_eq!(ResponsesClassifier.classify(&frame), FrameKind::Ignored);
        let frame = json!({"type": "response.output_text.delta"});
        assert_eq!(ResponsesClassifier.classify(&frame), FrameKind::Ignored);
    }

    #[test]
    fn responses_lifecycle_frames() {
        assert_eq!(
            ResponsesClassifier.classify(&json!({"type": "response.completed", "response": {}})),
            FrameKind::Completed
        );
        assert_eq!(
            ResponsesClassifier.classify(&json!({"type": "response.created"})),
            FrameKind::Ignored
        );
        assert_eq!(ResponsesClassifier.classify(&json!({"no_type": true})), FrameKind::Ignored);
    }

    #[test]
    fn responses_failures_carry_message() {
        let frame = json!({"type": "error", "error": {"message": "rate limited"}});
        assert_eq!(ResponsesClassifier.classify(&frame), FrameKind::Failed("rate limited".into()));

        let frame = json!({"type": "response.failed", "response": {"error": {"message": "server overloaded"}}});
        assert_eq!(
            ResponsesClassifier.classify(&frame),
            FrameKind::Failed("server overloaded".into())
        );

        let frame = json!({"type": "error", "message": "bad key"});
        assert_eq!(ResponsesClassifier.classify(&frame), FrameKind::Failed("bad key".into()));

        let frame = json!({"type": "response.failed"});
        assert_eq!(
            ResponsesClassifier.classify(&frame),
            FrameKind::Failed(GENERIC_UPSTREAM_ERROR.into())
        );
    }

    #[test]
    fn chat_completions_content_and_finish() {
        let frame = json!({"choices": [{"index": 0, "delta": {"content": "Hi"}, "finish_reason": null}]});
        assert_eq!(ChatCompletionsClassifier.classify(&frame), FrameKind::TextDelta("Hi".into()));

        let frame = json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]});
        assert_eq!(ChatCompletionsClassifier.classify(&frame), FrameKind::Completed);

        let frame = json!({"choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]});
        assert_eq!(ChatCompletionsClassifier.classify(&frame), FrameKind::Ignored);
    }

    #[test]
    fn chat_completions_error() {
        let frame = json!({"error": {"message": "context length exceeded", "type": "invalid_request_error"}});
        assert_eq!(
            ChatCompletionsClassifier.classify(&frame),
            FrameKind::Failed("context length exceeded".into())
        );
        let frame = json!({"error": null, "choices": []});
        assert_eq!(ChatCompletionsClassifier.classify(&frame), FrameKind::Ignored);
    }

    #[test]
    fn classifier_for_wire() {
        let frame = json!({"type": "response.completed"});
        assert_eq!(classifier_for(WireFormat::Responses).classify(&frame), FrameKind::Completed);
        assert_eq!(classifier_for(WireFormat::ChatCompletions).classify(&frame), FrameKind::Ignored);
    }
}
