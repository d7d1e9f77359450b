///! @see: SPEC_FULL.md section 4.6 (C6), `UserControlMessage` body: u16
///! event-type, then one i32 per value.
use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::consts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserControlEvent {
    StreamBegin { stream_id: i32 },
    StreamEof { stream_id: i32 },
    StreamDry { stream_id: i32 },
    SetBufferLength { stream_id: i32, buffer_length_ms: i32 },
    StreamIsRecorded { stream_id: i32 },
    PingRequest { timestamp: i32 },
    PingResponse { timestamp: i32 },
}

pub fn write(event: UserControlEvent) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(10);
    match event {
        UserControlEvent::StreamBegin { stream_id } => {
            body.write_u16::<BigEndian>(consts::EVENT_STREAM_BEGIN)?;
            body.write_i32::<BigEndian>(stream_id)?;
        }
        UserControlEvent::StreamEof { stream_id } => {
            body.write_u16::<BigEndian>(consts::EVENT_STREAM_EOF)?;
            body.write_i32::<BigEndian>(stream_id)?;
        }
        UserControlEvent::StreamDry { stream_id } => {
            body.write_u16::<BigEndian>(consts::EVENT_STREAM_DRY)?;
            body.write_i32::<BigEndian>(stream_id)?;
        }
        UserControlEvent::SetBufferLength {
            stream_id,
            buffer_length_ms,
        } => {
            body.write_u16::<BigEndian>(consts::EVENT_SET_BUFFER_LENGTH)?;
            body.write_i32::<BigEndian>(stream_id)?;
            body.write_i32::<BigEndian>(buffer_length_ms)?;
        }
        UserControlEvent::StreamIsRecorded { stream_id } => {
            body.write_u16::<BigEndian>(consts::EVENT_STREAM_IS_RECORDED)?;
            body.write_i32::<BigEndian>(stream_id)?;
        }
        UserControlEvent::PingRequest { timestamp } => {
            body.write_u16::<BigEndian>(consts::EVENT_PING_REQUEST)?;
            body.write_i32::<BigEndian>(timestamp)?;
        }
        UserControlEvent::PingResponse { timestamp } => {
            body.write_u16::<BigEndian>(consts::EVENT_PING_RESPONSE)?;
            body.write_i32::<BigEndian>(timestamp)?;
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_begin_body() {
        let body = write(UserControlEvent::StreamBegin { stream_id: 1 }).unwrap();
        assert_eq!(body, vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn set_buffer_length_body() {
        let body = write(UserControlEvent::SetBufferLength {
            stream_id: 1,
            buffer_length_ms: 300,
        })
        .unwrap();
        assert_eq!(
            body,
            vec![0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x2C]
        );
    }
}
