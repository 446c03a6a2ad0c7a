// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Chat relay
//
// Accepts a validated chat turn, opens a streaming call to the upstream
// text-generation service and re-emits its output as `token` / `done` /
// `error` events. Works one request at a time with no shared mutable state.

mod classifier;
mod parser;
mod processor;
mod types;
mod upstream;

pub use classifier::{
    classifier_for, upstream_error_message, ChatCompletionsClassifier, FrameClassifier,
    FrameKind, ResponsesClassifier, GENERIC_UPSTREAM_ERROR,
};
pub use parser::{SseBlock, SseBlockParser, UpstreamFrame, DONE_SENTINEL};
pub use processor::{truncate_chars, Relay, RelayOutcome, RelayStream, MAX_UPSTREAM_ERROR_CHARS};
pub use types::{
    ChatTurn, ChatTurnError, HistoryTurn, Lang, PromptMessage, RelayEvent, Role, TurnRole,
};
pub use upstream::{
    ByteStream, ChatUpstream, ReqwestUpstream, UpstreamError, UpstreamRequest, UpstreamResponse,
};
