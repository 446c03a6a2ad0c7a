// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Incremental SSE block parser
//
// Network reads arrive at arbitrary boundaries. Bytes accumulate until a
// blank line closes a block; only complete blocks are decoded, and the
// trailing partial block waits for the next read. Working on bytes keeps a
// multi-byte UTF-8 character split across two reads intact.

/// Sentinel payload some providers send as the last `data:` line.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One SSE block: an optional `event:` name and its joined `data:` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseBlock {
    pub event: Option<String>,
    /// `None` when the block carried no `data:` line at all.
    pub data: Option<String>,
}

/// What an upstream block means to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamFrame {
    Json(serde_json::Value),
    /// The literal `[DONE]` sentinel.
    Done,
}

impl SseBlock {
    /// Parse the text of one block (without its terminating blank line).
    pub fn parse(text: &str) -> Self {
        let mut event = None;
        let mut data: Option<Vec<&str>> = None;

        for line in text.lines() {
            if line.starts_with(':') {
                continue;
            }
            if let Some(value) = line.strip_prefix("data:") {
                data.get_or_insert_with(Vec::new).push(value.trim());
            } else if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim().to_string());
            }
        }

        Self {
            event,
            data: data.map(|lines| lines.join("\n")),
        }
    }

    /// Interpret the data payload. Blocks without data or with data that is
    /// neither JSON nor the sentinel yield `None`.
    pub fn frame(&self) -> Option<UpstreamFrame> {
        let data = self.data.as_deref()?;
        if data == DONE_SENTINEL {
            return Some(UpstreamFrame::Done);
        }
        serde_json::from_str(data).ok().map(UpstreamFrame::Json)
    }
}

/// Splits a byte stream into complete SSE blocks.
#[derive(Debug, Default)]
pub struct SseBlockParser {
    buffer: Vec<u8>,
}

impl SseBlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read; returns every block it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseBlock> {
        self.buffer.extend_from_slice(chunk);

        let mut blocks = Vec::new();
        let mut consumed = 0;
        while let Some((end, sep_len)) = find_block_end(&self.buffer[consumed..]) {
            let raw = &self.buffer[consumed..consumed + end];
            if !raw.iter().all(u8::is_ascii_whitespace) {
                blocks.push(SseBlock::parse(&String::from_utf8_lossy(raw)));
            }
            consumed += end + sep_len;
        }
        self.buffer.drain(..consumed);
        blocks
    }

    /// Flush a final block that ended without a blank line.
    pub fn finish(&mut self) -> Option<SseBlock> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(SseBlock::parse(&String::from_utf8_lossy(&rest)))
    }

    /// Bytes held back waiting for a block boundary.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Position and length of the first blank-line separator (`\n\n` or
/// `\r\n\r\n`).
fn find_block_end(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buf.len() {
        if buf[i] == b'\n' {
            if buf.get(i + 1) == Some(&b'\n') {
                return Some((i, 2));
            }
            if buf.get(i + 1) == Some(&b'\r') && buf.get(i + 2) == Some(&b'\n') {
                // "\r\n\r\n": the block ends before the first '\r'.
                let start = if i > 0 && buf[i - 1] == b'\r' { i - 1 } else { i };
                return Some((start, i + 3 - start));
            }
        }
        i += 1;
    }
    None
}
