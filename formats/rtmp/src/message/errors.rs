use std::io;

use amf_formats::AmfWriteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageWriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("AMF encoding error: {0}")]
    Amf(#[from] AmfWriteError),
    #[error("message type {0} has no serializer")]
    UnknownMessageType(u8),
}

pub type MessageWriteResult<T> = Result<T, MessageWriteError>;
