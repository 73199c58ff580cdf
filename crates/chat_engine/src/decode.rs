use chat_logging::{chat_debug, chat_warn};
use encoding_rs::{CoderResult, Decoder, UTF_8};

use crate::types::GenerateLine;
use crate::{ChunkParseFailure, StreamChunk};

const MAX_LOGGED_LINE: usize = 200;

/// Incremental newline-delimited JSON decoder.
///
/// Bytes may arrive split at any boundary, including inside a JSON object or
/// inside a multi-byte UTF-8 sequence. Text after the last newline stays
/// buffered until more bytes arrive.
pub struct NdjsonDecoder {
    utf8: Decoder,
    buffer: String,
    parse_failures: usize,
}

impl Default for NdjsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self {
            utf8: UTF_8.new_decoder_with_bom_removal(),
            buffer: String::new(),
            parse_failures: 0,
        }
    }

    /// Feeds one transport read and returns the chunks completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.decode_into_buffer(bytes, false);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let partial = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, partial);

        complete
            .split('\n')
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Ends decoding. The unterminated remainder is discarded and returned
    /// for diagnostics when it holds anything but whitespace.
    pub fn finish(&mut self) -> Option<String> {
        self.decode_into_buffer(&[], true);
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Number of lines dropped because they were not valid JSON.
    pub fn parse_failures(&self) -> usize {
        self.parse_failures
    }

    #[cfg(test)]
    fn pending_text(&self) -> &str {
        &self.buffer
    }

    fn decode_into_buffer(&mut self, bytes: &[u8], last: bool) {
        if let Some(needed) = self.utf8.max_utf8_buffer_length(bytes.len()) {
            self.buffer.reserve(needed);
        }
        let mut read = 0;
        loop {
            let (result, consumed, _had_replacements) =
                self.utf8
                    .decode_to_string(&bytes[read..], &mut self.buffer, last);
            read += consumed;
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => self.buffer.reserve(bytes.len() - read + 4),
            }
        }
    }

    fn parse_line(&mut self, line: &str) -> Option<StreamChunk> {
        if line.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<GenerateLine>(line) {
            Ok(parsed) => {
                if let Some(error) = parsed.error.as_deref() {
                    chat_warn!("server reported an error in stream: {}", error);
                }
                Some(StreamChunk {
                    content: parsed.response.unwrap_or_default(),
                    done: parsed.done,
                })
            }
            Err(err) => {
                self.parse_failures += 1;
                let failure = ChunkParseFailure {
                    line: truncate_for_log(line),
                    message: err.to_string(),
                };
                chat_warn!("{}", failure);
                chat_debug!("{} unparsable lines so far", self.parse_failures);
                None
            }
        }
    }
}

fn truncate_for_log(line: &str) -> String {
    if line.len() <= MAX_LOGGED_LINE {
        return line.to_string();
    }
    let mut end = MAX_LOGGED_LINE;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}
