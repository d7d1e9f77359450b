///! @see: SPEC_FULL.md section 4.6 (C6), protocol control message bodies.
pub const MESSAGE_TYPE_SET_CHUNK_SIZE: u8 = 1;
pub const MESSAGE_TYPE_ABORT: u8 = 2;
pub const MESSAGE_TYPE_ACKNOWLEDGEMENT: u8 = 3;
pub const MESSAGE_TYPE_WINDOW_ACK_SIZE: u8 = 5;
pub const MESSAGE_TYPE_SET_PEER_BANDWIDTH: u8 = 6;

/// `SetPeerBandwidth`'s limit-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LimitType {
    Hard = 0,
    Soft = 1,
    Dynamic = 2,
}
