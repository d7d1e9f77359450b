pub mod consts;
mod writer;

pub use consts::LimitType;
pub use writer::{abort_message, acknowledgement, set_chunk_size, set_peer_bandwidth, window_ack_size};
