use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmfWriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("u29 value out of range, value: {value}")]
    U29OutOfRange { value: u32 },
    #[error("size value out of range, value: {value}")]
    SizeOutOfRange { value: usize },
    #[error("string byte length {len} exceeds the short-string limit of 65535")]
    StringTooLong { len: usize },
    #[error("value is not representable in AMF0: {kind}")]
    UnsupportedInAmf0 { kind: &'static str },
    #[error("class description required for {what} but the oracle returned none")]
    MissingClassDescription { what: &'static str },
    #[error(
        "value flagged externalizable for class {class} does not expose a body-emit capability"
    )]
    NotExternalizable { class: String },
    #[error("dynamic class {class} does not expose a string-keyed map of its trailing entries")]
    NotDynamic { class: String },
    #[error("externalizable recursion exceeded the depth limit of {limit}")]
    DepthLimit { limit: usize },
    #[error("null required argument: {what}")]
    NullArgument { what: &'static str },
}

pub type AmfWriteResult<T> = Result<T, AmfWriteError>;
