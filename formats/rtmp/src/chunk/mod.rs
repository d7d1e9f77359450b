pub mod consts;
mod errors;
mod writer;

pub use consts::{ChunkHeaderFormat, DEFAULT_CHUNK_SIZE};
pub use errors::{ChunkWriteError, ChunkWriteResult};
pub use writer::{ChunkWriter, RtmpHeader};
