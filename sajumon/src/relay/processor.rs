// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Relay processor
//
// Opens one upstream stream per chat turn and re-emits it as normalized
// events through a bounded channel. The returned stream owns a drop guard on
// the request's cancellation token: when the HTTP layer drops the body
// (client disconnected) the token fires, the worker stops waiting on the
// upstream and tears down without emitting anything else.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use super::classifier::{classifier_for, FrameClassifier, FrameKind};
use super::parser::{SseBlockParser, UpstreamFrame};
use super::types::{ChatTurn, PromptMessage, RelayEvent, Role};
use super::upstream::{ByteStream, ChatUpstream, ReqwestUpstream, UpstreamError, UpstreamRequest};
use crate::config::{Config, PromptConfig, DEFAULT_PROMPT_EN, DEFAULT_PROMPT_KO};

/// Maximum characters of the description sent when the upstream call is
/// rejected with a non-success status.
pub const MAX_UPSTREAM_ERROR_CHARS: usize = 500;

/// Outbound event buffer per request.
const EVENT_CHANNEL_CAPACITY: usize = 64;

const DEFAULT_ERROR_BODY_LIMIT: usize = 4096;

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// Turns chat turns into streams of `RelayEvent`s.
///
/// Holds no per-request state; every `start` call is isolated and many may
/// run concurrently.
pub struct Relay {
    upstream: Arc<dyn ChatUpstream>,
    classifier: Arc<dyn FrameClassifier>,
    prompts: PromptConfig,
    error_body_limit: usize,
}

impl Relay {
    /// Create a relay with injected dependencies and the built-in prompts.
    pub fn new(upstream: Arc<dyn ChatUpstream>, classifier: Arc<dyn FrameClassifier>) -> Self {
        Self {
            upstream,
            classifier,
            prompts: PromptConfig {
                en: DEFAULT_PROMPT_EN.to_string(),
                ko: DEFAULT_PROMPT_KO.to_string(),
            },
            error_body_limit: DEFAULT_ERROR_BODY_LIMIT,
        }
    }

    /// Production relay: reqwest upstream and classifier from config.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let upstream = Arc::new(ReqwestUpstream::new(client, config.upstream.clone()));
        Self::new(upstream, classifier_for(config.upstream.wire))
            .with_prompts(config.prompts.clone())
            .with_error_body_limit(config.upstream.error_body_limit)
    }

    pub fn with_prompts(mut self, prompts: PromptConfig) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_error_body_limit(mut self, limit: usize) -> Self {
        self.error_body_limit = limit;
        self
    }

    /// The exact message sequence the upstream receives: the localized
    /// system turn, the history in order, then the new user message.
    pub fn build_prompt(&self, turn: &ChatTurn) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(turn.history.len() + 2);
        messages.push(PromptMessage::new(Role::System, self.prompts.system_prompt(turn.lang)));
        messages.extend(
            turn.history
                .iter()
                .map(|h| PromptMessage::new(h.role.into(), h.content.clone())),
        );
        messages.push(PromptMessage::new(Role::User, turn.message.clone()));
        messages
    }

    /// Start relaying a validated turn. Dropping the returned stream aborts
    /// the relay.
    pub fn start(&self, turn: ChatTurn) -> RelayStream {
        self.start_with(turn, CancellationToken::new())
    }

    /// Like `start`, with a caller-owned cancellation token. Cancelling it
    /// has the same effect as dropping the stream.
    pub fn start_with(&self, turn: ChatTurn, cancel: CancellationToken) -> RelayStream {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            request_id = %request_id,
            session_id = %turn.session_id,
            archetype_id = %turn.archetype_id,
            lang = turn.lang.as_str(),
            history = turn.history.len(),
            "relay started"
        );

        let worker = Worker {
            upstream: self.upstream.clone(),
            classifier: self.classifier.clone(),
            error_body_limit: self.error_body_limit,
            request: UpstreamRequest {
                request_id: request_id.clone(),
                messages: self.build_prompt(&turn),
            },
            cancel: cancel.clone(),
            tx,
            tokens: 0,
        };

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = worker.run().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                RelayOutcome::Completed { tokens } => {
                    tracing::info!(request_id = %request_id, tokens, elapsed_ms, "relay completed")
                }
                RelayOutcome::Failed { tokens, reason } => tracing::warn!(
                    request_id = %request_id,
                    tokens,
                    elapsed_ms,
                    reason = %reason,
                    "relay failed"
                ),
                RelayOutcome::Aborted { tokens } => {
                    tracing::info!(request_id = %request_id, tokens, elapsed_ms, "relay aborted by client")
                }
            }
        });

        RelayStream {
            events: ReceiverStream::new(rx),
            _guard: cancel.drop_guard(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output stream
// ---------------------------------------------------------------------------

/// Events of one relay request. Dropping it cancels the request.
pub struct RelayStream {
    events: ReceiverStream<RelayEvent>,
    _guard: DropGuard,
}

impl Stream for RelayStream {
    type Item = RelayEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// How a relay request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { tokens: usize },
    Failed { tokens: usize, reason: String },
    Aborted { tokens: usize },
}

/// The client is gone; stop without emitting.
struct Aborted;

struct Worker {
    upstream: Arc<dyn ChatUpstream>,
    classifier: Arc<dyn FrameClassifier>,
    error_body_limit: usize,
    request: UpstreamRequest,
    cancel: CancellationToken,
    tx: mpsc::Sender<RelayEvent>,
    tokens: usize,
}

impl Worker {
    async fn run(mut self) -> RelayOutcome {
        match self.relay().await {
            Ok(outcome) => outcome,
            Err(Aborted) => RelayOutcome::Aborted {
                tokens: self.tokens,
            },
        }
    }

    async fn relay(&mut self) -> Result<RelayOutcome, Aborted> {
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Aborted),
            opened = self.upstream.open(self.request.clone(), self.cancel.clone()) => opened,
        };

        let response = match opened {
            Ok(response) => response,
            Err(UpstreamError::Cancelled) => return Err(Aborted),
            Err(e) => return self.fail(e.to_string()).await,
        };

        if !response.status.is_success() {
            let body = self.read_error_body(response.body).await?;
            let description = format!("upstream HTTP {} {}", response.status.as_u16(), body.trim());
            return self.fail(truncate_chars(description.trim_end(), MAX_UPSTREAM_ERROR_CHARS)).await;
        }

        let mut body = response.body;
        let mut parser = SseBlockParser::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Aborted),
                next = body.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return self.fail(e.to_string()).await,
                None => break,
            };

            for block in parser.push(&chunk) {
                match block.frame() {
                    Some(frame) => {
                        if let Some(outcome) = self.handle_frame(frame).await? {
                            return Ok(outcome);
                        }
                    }
                    None => tracing::debug!(
                        request_id = %self.request.request_id,
                        event = ?block.event,
                        "skipping upstream block without a usable frame"
                    ),
                }
            }
        }

        if let Some(frame) = parser.finish().and_then(|block| block.frame()) {
            if let Some(outcome) = self.handle_frame(frame).await? {
                return Ok(outcome);
            }
        }

        // Upstream ended without an explicit terminal frame.
        self.complete().await
    }

    /// Act on one frame. `Some` means the relay reached its terminal event.
    async fn handle_frame(&mut self, frame: UpstreamFrame) -> Result<Option<RelayOutcome>, Aborted> {
        let value = match frame {
            UpstreamFrame::Done => return self.complete().await.map(Some),
            UpstreamFrame::Json(value) => value,
        };

        match self.classifier.classify(&value) {
            FrameKind::TextDelta(token) => {
                self.emit(RelayEvent::Token(token)).await?;
                self.tokens += 1;
                Ok(None)
            }
            FrameKind::Completed => self.complete().await.map(Some),
            FrameKind::Failed(message) => self.fail(message).await.map(Some),
            FrameKind::Ignored => Ok(None),
        }
    }

    async fn complete(&self) -> Result<RelayOutcome, Aborted> {
        self.emit(RelayEvent::Done).await?;
        Ok(RelayOutcome::Completed {
            tokens: self.tokens,
        })
    }

    async fn fail(&self, reason: String) -> Result<RelayOutcome, Aborted> {
        self.emit(RelayEvent::Error(reason.clone())).await?;
        Ok(RelayOutcome::Failed {
            tokens: self.tokens,
            reason,
        })
    }

    async fn emit(&self, event: RelayEvent) -> Result<(), Aborted> {
        if self.cancel.is_cancelled() {
            return Err(Aborted);
        }
        self.tx.send(event).await.map_err(|_| Aborted)
    }

    /// Read at most `error_body_limit` bytes of a rejected response.
    async fn read_error_body(&self, mut body: ByteStream) -> Result<String, Aborted> {
        let mut collected = Vec::new();
        while collected.len() < self.error_body_limit {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Aborted),
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => collected.extend_from_slice(&chunk),
                Some(Err(_)) | None => break,
            }
        }
        collected.truncate(self.error_body_limit);
        Ok(String::from_utf8_lossy(&collected).into_owned())
    }
}

/// First `max` characters of `s` (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("abc", 2), "ab");
        assert_eq!(truncate_chars("가나다", 2), "가나");
        assert_eq!(truncate_chars("short", 500), "short");
    }
}
