// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::net::IpAddr;

use axum::http::{HeaderName, HeaderValue, Method};

use crate::relay::Lang;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Parsed and validated service config.
#[derive(Debug, Clone)]
pub struct Config {
    /// Config format version. Always "v1".
    pub version: String,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub prompts: PromptConfig,
    /// SHA256 of the raw YAML: "sha256:{hex}". Logged at startup.
    pub fingerprint: String,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Listener address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

/// Cross-origin policy for the browser client. Origins are an explicit
/// allow-list; wildcards are rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<HeaderValue>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<HeaderName>,
    pub allow_credentials: bool,
}

/// Which streaming event vocabulary the upstream speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST /v1/responses` with `response.output_text.delta` style events.
    Responses,
    /// `POST /v1/chat/completions` with `choices[0].delta.content` chunks.
    ChatCompletions,
}

impl WireFormat {
    pub fn path(self) -> &'static str {
        match self {
            WireFormat::Responses => "/v1/responses",
            WireFormat::ChatCompletions => "/v1/chat/completions",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::Responses => "responses",
            WireFormat::ChatCompletions => "chat_completions",
        }
    }
}

/// The text-generation provider the relay forwards to.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Scheme + host, no trailing slash, e.g. "https://api.openai.com".
    pub base_url: String,
    pub wire: WireFormat,
    pub model: String,
    /// Bearer credential. Never printed by `Debug`.
    pub api_key: String,
    /// Bound on establishing the upstream response (status + headers).
    pub connect_timeout_ms: Option<u64>,
    /// Bytes of a failed upstream response body read for the error event.
    pub error_body_limit: usize,
}

impl UpstreamConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.wire.path())
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("wire", &self.wire)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("error_body_limit", &self.error_body_limit)
            .finish()
    }
}

/// Localized system instructions prepended to every conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub en: String,
    pub ko: String,
}

impl PromptConfig {
    pub fn system_prompt(&self, lang: Lang) -> &str {
        match lang {
            Lang::En => &self.en,
            Lang::Ko => &self.ko,
        }
    }
}
