///! RTMP chunking/multiplexing core. @see SPEC_FULL.md sections 4.6-4.8.
pub mod chunk;
pub mod command;
pub mod message;
pub mod protocol_control;
pub mod queue;
pub mod user_control;

pub use chunk::{ChunkHeaderFormat, ChunkWriteError, ChunkWriter, RtmpHeader, DEFAULT_CHUNK_SIZE};
pub use command::{CallOutcome, Command};
pub use message::{AmfEncoder, MessageBody};
pub use queue::{DriveError, OutgoingQueue, Packet};
