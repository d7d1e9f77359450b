///! @see: SPEC_FULL.md section 4.6 (C6), protocol control message bodies.
use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::consts::LimitType;

/// Writes the 4-byte body of a `SetChunkSize` message.
pub fn set_chunk_size(new_chunk_size: i32) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(4);
    body.write_i32::<BigEndian>(new_chunk_size)?;
    Ok(body)
}

/// Writes the 4-byte body of an `AbortMessage`.
pub fn abort_message(chunk_stream_id: i32) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(4);
    body.write_i32::<BigEndian>(chunk_stream_id)?;
    Ok(body)
}

/// Writes the 4-byte body of an `Acknowledgement`.
pub fn acknowledgement(sequence_number: i32) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(4);
    body.write_i32::<BigEndian>(sequence_number)?;
    Ok(body)
}

/// Writes the 4-byte body of a `WindowAcknowledgementSize`.
pub fn window_ack_size(window: i32) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(4);
    body.write_i32::<BigEndian>(window)?;
    Ok(body)
}

/// Writes the 5-byte body of a `SetPeerBandwidth`.
pub fn set_peer_bandwidth(window: i32, limit_type: LimitType) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(5);
    body.write_i32::<BigEndian>(window)?;
    body.write_u8(limit_type as u8)?;
    Ok(body)
}
