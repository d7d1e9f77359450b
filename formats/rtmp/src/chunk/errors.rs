use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkWriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("chunk-stream id {0} is out of the representable range")]
    ChunkStreamIdOutOfRange(u32),
    #[error("packet length {0} does not fit in a 24-bit field")]
    PacketLengthOutOfRange(u32),
    #[error("sink error: {0}")]
    Sink(#[from] utils::sink::SinkError),
}

pub type ChunkWriteResult<T> = Result<T, ChunkWriteError>;
