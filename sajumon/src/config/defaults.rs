// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Built-in values for every optional config key.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["https://sajumon.netlify.app", "http://localhost:5173"];
pub const DEFAULT_ALLOWED_METHODS: &[&str] = &["GET", "POST", "OPTIONS"];
pub const DEFAULT_ALLOWED_HEADERS: &[&str] = &["Content-Type", "Authorization"];

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_WIRE: &str = "responses";
pub const DEFAULT_MODEL: &str = "gpt-5";
/// Empty when the variable is unset; the server warns at startup.
pub const DEFAULT_API_KEY: &str = "${OPENAI_API_KEY:-}";
pub const DEFAULT_ERROR_BODY_LIMIT: usize = 4096;

pub const DEFAULT_PROMPT_EN: &str = "You are a helpful assistant. Be concise and clear.";
pub const DEFAULT_PROMPT_KO: &str = "너는 친절하고 정확한 상담사다. 짧고 명확하게 답한다.";

pub fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
