///! @see: SPEC_FULL.md section 4.6 (C6), RTMP message type ids.
pub use crate::protocol_control::consts::{
    MESSAGE_TYPE_ABORT, MESSAGE_TYPE_ACKNOWLEDGEMENT, MESSAGE_TYPE_SET_CHUNK_SIZE, MESSAGE_TYPE_SET_PEER_BANDWIDTH,
    MESSAGE_TYPE_WINDOW_ACK_SIZE,
};

pub const MESSAGE_TYPE_USER_CONTROL: u8 = 4;
pub const MESSAGE_TYPE_AUDIO: u8 = 8;
pub const MESSAGE_TYPE_VIDEO: u8 = 9;
pub const MESSAGE_TYPE_DATA_AMF3: u8 = 15;
pub const MESSAGE_TYPE_SHARED_OBJECT_AMF3: u8 = 16;
pub const MESSAGE_TYPE_COMMAND_AMF3: u8 = 17;
pub const MESSAGE_TYPE_DATA_AMF0: u8 = 18;
pub const MESSAGE_TYPE_SHARED_OBJECT_AMF0: u8 = 19;
pub const MESSAGE_TYPE_COMMAND_AMF0: u8 = 20;
pub const MESSAGE_TYPE_AGGREGATE: u8 = 22;
