use std::collections::VecDeque;

use bytes::Bytes;
use chat_logging::chat_debug;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{NdjsonDecoder, StreamChunk, StreamError};

/// Raw response body as delivered by the transport.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Lazy, forward-only sequence of chunks decoded from a byte stream.
///
/// At most one transport read is outstanding, and only when no decoded chunk
/// is waiting to be handed out. The sequence ends after a `done` chunk, at
/// transport end, after a transport error or after cancellation.
pub struct ChunkStream {
    bytes: ByteStream,
    decoder: NdjsonDecoder,
    ready: VecDeque<StreamChunk>,
    cancel: CancellationToken,
    finished: bool,
}

impl ChunkStream {
    pub fn new(bytes: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            bytes,
            decoder: NdjsonDecoder::new(),
            ready: VecDeque::new(),
            cancel,
            finished: false,
        }
    }

    pub async fn next(&mut self) -> Option<Result<StreamChunk, StreamError>> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                if chunk.done {
                    self.close();
                }
                return Some(Ok(chunk));
            }
            if self.finished {
                return None;
            }

            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                read = self.bytes.next() => Some(read),
            };

            match read {
                None => {
                    self.close();
                    return Some(Err(StreamError::Cancelled));
                }
                Some(Some(Ok(bytes))) => {
                    let chunks = self.decoder.feed(&bytes);
                    self.ready.extend(chunks);
                }
                Some(Some(Err(err))) => {
                    self.close();
                    return Some(Err(err));
                }
                Some(None) => {
                    self.close();
                    return None;
                }
            }
        }
    }

    /// Lines dropped so far because they were not valid JSON.
    pub fn parse_failures(&self) -> usize {
        self.decoder.parse_failures()
    }

    fn close(&mut self) {
        self.finished = true;
        self.ready.clear();
        if let Some(rest) = self.decoder.finish() {
            chat_debug!("discarding {} bytes of unterminated stream data", rest.len());
        }
    }
}
