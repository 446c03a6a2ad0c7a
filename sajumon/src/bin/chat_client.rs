// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// chat-client: send one chat turn to a running relay and print the reply as
// it streams in.
//
// Usage:
//   chat-client --archetype gye-sa --lang ko --message "안녕"
//   chat-client --url http://localhost:3001/api/chat --message "hello"

use std::io::Write;

use clap::Parser;
use futures_util::StreamExt;

use sajumon::relay::SseBlockParser;

#[derive(Parser)]
#[command(name = "chat-client", about = "Stream one chat turn from a sajumon relay.")]
struct Cli {
    /// Chat endpoint of the relay.
    #[arg(long, default_value = "http://localhost:3001/api/chat", env = "SAJUMON_CHAT_URL")]
    url: String,

    /// Session identifier (random when omitted).
    #[arg(long)]
    session: Option<String>,

    /// Persona key, e.g. "gye-sa".
    #[arg(long, default_value = "gap-ja")]
    archetype: String,

    /// Reply language.
    #[arg(long, default_value = "en", value_parser = ["en", "ko"])]
    lang: String,

    /// The user message.
    #[arg(long)]
    message: String,
}

enum Outcome {
    Done,
    Failed(String),
}

/// Handle one relay event; `Some` once a terminal event arrives.
fn on_event(event: &str, data: &serde_json::Value, out: &mut impl Write) -> Option<Outcome> {
    match event {
        "token" => {
            if let Some(token) = data.get("token").and_then(|t| t.as_str()) {
                let _ = write!(out, "{token}");
                let _ = out.flush();
            }
            None
        }
        "done" => Some(Outcome::Done),
        "error" => Some(Outcome::Failed(
            data.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        )),
        _ => None,
    }
}

async fn run(cli: Cli) -> Result<Outcome, String> {
    let session = cli
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let body = serde_json::json!({
        "sessionId": session,
        "archetypeId": cli.archetype,
        "lang": cli.lang,
        "message": cli.message,
        "history": [],
    });

    let resp = reqwest::Client::new()
        .post(&cli.url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(format!("relay returned HTTP {status}: {text}"));
    }

    let mut stdout = std::io::stdout();
    let mut parser = SseBlockParser::new();
    let mut body = resp.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| format!("stream interrupted: {e}"))?;
        for block in parser.push(&chunk) {
            let (Some(event), Some(data)) = (block.event.as_deref(), block.data.as_deref()) else {
                continue;
            };
            let data: serde_json::Value = serde_json::from_str(data).unwrap_or_default();
            if let Some(outcome) = on_event(event, &data, &mut stdout) {
                return Ok(outcome);
            }
        }
    }

    Err("stream ended without a terminal event".to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(url = %cli.url, lang = %cli.lang, "sending chat turn");

    match run(cli).await {
        Ok(Outcome::Done) => println!(),
        Ok(Outcome::Failed(message)) => {
            println!();
            eprintln!("error: {message}");
            std::process::exit(1);
        }
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}
