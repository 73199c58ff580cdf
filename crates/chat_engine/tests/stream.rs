use bytes::Bytes;
use chat_engine::{ByteStream, ChunkStream, StreamChunk, StreamError};
use futures_util::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn byte_stream(pieces: Vec<Result<&'static str, StreamError>>) -> ByteStream {
    stream::iter(
        pieces
            .into_iter()
            .map(|piece| piece.map(|text| Bytes::from_static(text.as_bytes()))),
    )
    .boxed()
}

async fn collect(mut chunks: ChunkStream) -> Vec<Result<StreamChunk, StreamError>> {
    let mut out = Vec::new();
    while let Some(item) = chunks.next().await {
        out.push(item);
    }
    out
}

#[tokio::test]
async fn stops_after_done_chunk() {
    let bytes = byte_stream(vec![
        Ok("{\"response\":\"a\",\"done\":false}\n{\"response\":\"b\",\"done\":true}\n"),
        Ok("{\"response\":\"ignored\",\"done\":false}\n"),
    ]);

    let items = collect(ChunkStream::new(bytes, CancellationToken::new())).await;

    assert_eq!(
        items,
        vec![
            Ok(StreamChunk::new("a", false)),
            Ok(StreamChunk::new("b", true)),
        ]
    );
}

#[tokio::test]
async fn transport_end_without_done_ends_sequence() {
    let bytes = byte_stream(vec![
        Ok("{\"response\":\"x\",\"do"),
        Ok("ne\":false}\n{\"response\":\"partial"),
    ]);

    let items = collect(ChunkStream::new(bytes, CancellationToken::new())).await;

    // The unterminated trailing line is discarded, not flushed.
    assert_eq!(items, vec![Ok(StreamChunk::new("x", false))]);
}

#[tokio::test]
async fn transport_error_is_yielded_once_then_ends() {
    let bytes = byte_stream(vec![
        Ok("{\"response\":\"x\",\"done\":false}\n"),
        Err(StreamError::Transport {
            message: "connection reset".to_string(),
        }),
        Ok("{\"response\":\"never\",\"done\":false}\n"),
    ]);

    let items = collect(ChunkStream::new(bytes, CancellationToken::new())).await;

    assert_eq!(
        items,
        vec![
            Ok(StreamChunk::new("x", false)),
            Err(StreamError::Transport {
                message: "connection reset".to_string(),
            }),
        ]
    );
}

#[tokio::test]
async fn cancellation_ends_with_cancelled_error() {
    let cancel = CancellationToken::new();
    let bytes: ByteStream = stream::iter(vec![Ok::<_, StreamError>(Bytes::from_static(
        b"{\"response\":\"first\",\"done\":false}\n",
    ))])
    .chain(stream::pending())
    .boxed();
    let mut chunks = ChunkStream::new(bytes, cancel.clone());

    assert_eq!(
        chunks.next().await,
        Some(Ok(StreamChunk::new("first", false)))
    );

    cancel.cancel();
    assert_eq!(chunks.next().await, Some(Err(StreamError::Cancelled)));
    assert_eq!(chunks.next().await, None);
}

#[tokio::test]
async fn parse_failures_are_counted_not_yielded() {
    let bytes = byte_stream(vec![Ok(
        "garbage\n{\"response\":\"ok\",\"done\":true}\n",
    )]);
    let mut chunks = ChunkStream::new(bytes, CancellationToken::new());

    assert_eq!(chunks.next().await, Some(Ok(StreamChunk::new("ok", true))));
    assert_eq!(chunks.parse_failures(), 1);
    assert_eq!(chunks.next().await, None);
}
