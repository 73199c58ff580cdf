//! Chat engine: streaming generation client and state file IO.
mod decode;
mod generate;
mod persist;
mod stream;
mod types;

pub use decode::NdjsonDecoder;
pub use generate::{GenerateSettings, Generator, ReqwestGenerator, DEFAULT_BASE_URL};
pub use persist::{PersistError, StateFile};
pub use stream::{ByteStream, ChunkStream};
pub use types::{ChunkParseFailure, StreamChunk, StreamError};
