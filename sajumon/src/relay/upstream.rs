// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Upstream model client
//
// `ChatUpstream` is the injection point between the relay and the
// text-generation provider. The reqwest implementation posts the prompt with
// `stream: true` and hands back the status and the raw body byte stream;
// interpreting that stream is the relay's job.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::types::PromptMessage;
use crate::config::{UpstreamConfig, WireFormat};

// ---------------------------------------------------------------------------
// Interface
// ---------------------------------------------------------------------------

/// Raw upstream body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// One streaming call to the provider.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Correlates upstream logs with the inbound request.
    pub request_id: String,
    /// System turn, history, then the new user message.
    pub messages: Vec<PromptMessage>,
}

/// Established upstream response. The body has not been read yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: ByteStream,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream request timed out: {0}")]
    Timeout(String),

    #[error("upstream request cancelled")]
    Cancelled,
}

/// Opens streaming calls to the text-generation provider.
///
/// `cancel` fires when the inbound client goes away; implementations should
/// stop establishing the call and return `UpstreamError::Cancelled`.
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    async fn open(
        &self,
        request: UpstreamRequest,
        cancel: CancellationToken,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

pub struct ReqwestUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl ReqwestUpstream {
    pub fn new(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    /// JSON body for the configured wire format.
    pub fn request_body(&self, messages: &[PromptMessage]) -> serde_json::Value {
        match self.config.wire {
            WireFormat::Responses => json!({
                "model": self.config.model,
                "input": messages,
                "stream": true,
            }),
            WireFormat::ChatCompletions => json!({
                "model": self.config.model,
                "messages": messages,
                "stream": true,
            }),
        }
    }

    async fn establish(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        let sent = match self.config.connect_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), builder.send())
                .await
                .map_err(|_| UpstreamError::Timeout(format!("no response within {ms}ms")))?,
            None => builder.send().await,
        };
        sent.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(e.to_string())
            } else {
                UpstreamError::Transport(e.to_string())
            }
        })
    }
}

#[async_trait]
impl ChatUpstream for ReqwestUpstream {
    async fn open(
        &self,
        request: UpstreamRequest,
        cancel: CancellationToken,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.config.endpoint();
        tracing::debug!(
            request_id = %request.request_id,
            url = %url,
            model = %self.config.model,
            messages = request.messages.len(),
            "opening upstream stream"
        );

        let mut builder = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&self.request_body(&request.messages));
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            resp = self.establish(builder) => resp?,
        };

        let status = resp.status();
        let body = resp
            .bytes_stream()
            .map_err(|e| UpstreamError::Transport(e.to_string()));

        Ok(UpstreamResponse {
            status,
            body: Box::pin(body),
        })
    }
}
