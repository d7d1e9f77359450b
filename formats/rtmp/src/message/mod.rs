///! @see: SPEC_FULL.md section 4.6 (C6), RTMP message body serializer.
pub mod consts;
pub mod errors;

use std::io::Write;

use amf_formats::{amf0, amf3, ObjectEncoding, Value};
use byteorder::WriteBytesExt;

use crate::command::{write_command_or_data, Command};
use crate::protocol_control::{self, LimitType};
use crate::user_control::{self, UserControlEvent};
use errors::MessageWriteResult;

/// Dispatches to whichever concrete AMF writer the session's
/// `objectEncoding` selected. @see SPEC_FULL.md Design Notes, "Dual
/// sync/async encoder bodies" — same idea applied to the AMF0/AMF3 switch
/// instead: one call site, one enum, no duplicated command-writing logic.
pub enum AmfEncoder<W> {
    Amf0(amf0::Writer<W>),
    Amf3(amf3::Writer<W>),
}

impl<W: Write> AmfEncoder<W> {
    pub fn write_value(&mut self, value: &Value) -> amf_formats::AmfWriteResult<()> {
        match self {
            AmfEncoder::Amf0(writer) => writer.write_value(value),
            AmfEncoder::Amf3(writer) => writer.write_value(value),
        }
    }
}

/// Every RTMP message type this core can serialize. @see SPEC_FULL.md
/// section 4.6, the per-type body table.
pub enum MessageBody {
    SetChunkSize { new_chunk_size: i32 },
    AbortMessage { chunk_stream_id: i32 },
    Acknowledgement { sequence_number: i32 },
    UserControl(UserControlEvent),
    WindowAckSize { window: i32 },
    SetPeerBandwidth { window: i32, limit_type: LimitType },
    Audio(Vec<u8>),
    Video(Vec<u8>),
    DataAmf0(Command),
    CommandAmf0(Command),
    DataAmf3(Command),
    CommandAmf3(Command),
    /// Reserved; unimplemented pending a decoder specification. @see
    /// SPEC_FULL.md Design Notes, Open Questions.
    SharedObjectAmf0,
    SharedObjectAmf3,
    Aggregate(Vec<u8>),
}

impl MessageBody {
    pub fn message_type(&self) -> u8 {
        match self {
            MessageBody::SetChunkSize { .. } => consts::MESSAGE_TYPE_SET_CHUNK_SIZE,
            MessageBody::AbortMessage { .. } => consts::MESSAGE_TYPE_ABORT,
            MessageBody::Acknowledgement { .. } => consts::MESSAGE_TYPE_ACKNOWLEDGEMENT,
            MessageBody::UserControl(_) => consts::MESSAGE_TYPE_USER_CONTROL,
            MessageBody::WindowAckSize { .. } => consts::MESSAGE_TYPE_WINDOW_ACK_SIZE,
            MessageBody::SetPeerBandwidth { .. } => consts::MESSAGE_TYPE_SET_PEER_BANDWIDTH,
            MessageBody::Audio(_) => consts::MESSAGE_TYPE_AUDIO,
            MessageBody::Video(_) => consts::MESSAGE_TYPE_VIDEO,
            MessageBody::DataAmf0(_) => consts::MESSAGE_TYPE_DATA_AMF0,
            MessageBody::CommandAmf0(_) => consts::MESSAGE_TYPE_COMMAND_AMF0,
            MessageBody::DataAmf3(_) => consts::MESSAGE_TYPE_DATA_AMF3,
            MessageBody::CommandAmf3(_) => consts::MESSAGE_TYPE_COMMAND_AMF3,
            MessageBody::SharedObjectAmf0 => consts::MESSAGE_TYPE_SHARED_OBJECT_AMF0,
            MessageBody::SharedObjectAmf3 => consts::MESSAGE_TYPE_SHARED_OBJECT_AMF3,
            MessageBody::Aggregate(_) => consts::MESSAGE_TYPE_AGGREGATE,
        }
    }
}

/// Composes `body` into a scratch buffer: a fresh in-memory sink with a
/// freshly initialized AMF reference context, so reference indices never
/// cross message boundaries. @see SPEC_FULL.md section 4.6.
pub fn compose(body: &MessageBody) -> MessageWriteResult<Vec<u8>> {
    match body {
        MessageBody::SetChunkSize { new_chunk_size } => Ok(protocol_control::set_chunk_size(*new_chunk_size)?),
        MessageBody::AbortMessage { chunk_stream_id } => Ok(protocol_control::abort_message(*chunk_stream_id)?),
        MessageBody::Acknowledgement { sequence_number } => Ok(protocol_control::acknowledgement(*sequence_number)?),
        MessageBody::UserControl(event) => Ok(user_control::write(*event)?),
        MessageBody::WindowAckSize { window } => Ok(protocol_control::window_ack_size(*window)?),
        MessageBody::SetPeerBandwidth { window, limit_type } => {
            Ok(protocol_control::set_peer_bandwidth(*window, *limit_type)?)
        }
        MessageBody::Audio(bytes) | MessageBody::Video(bytes) | MessageBody::Aggregate(bytes) => Ok(bytes.clone()),
        MessageBody::DataAmf0(command) => compose_command(command, ObjectEncoding::Amf0, false),
        MessageBody::CommandAmf0(command) => compose_command(command, ObjectEncoding::Amf0, false),
        MessageBody::DataAmf3(command) => compose_command(command, ObjectEncoding::Amf3, false),
        MessageBody::CommandAmf3(command) => compose_command(command, ObjectEncoding::Amf3, true),
        MessageBody::SharedObjectAmf0 | MessageBody::SharedObjectAmf3 => Ok(Vec::new()),
    }
}

fn compose_command(command: &Command, encoding: ObjectEncoding, leading_pad: bool) -> MessageWriteResult<Vec<u8>> {
    let mut scratch = Vec::new();
    if leading_pad {
        scratch.write_u8(0x00)?;
    }
    let mut encoder = match encoding {
        ObjectEncoding::Amf0 => AmfEncoder::Amf0(amf0::Writer::new(scratch)),
        ObjectEncoding::Amf3 => AmfEncoder::Amf3(amf3::Writer::new(scratch)),
    };
    write_command_or_data(&mut encoder, command)?;
    scratch = match encoder {
        AmfEncoder::Amf0(w) => w.into_inner(),
        AmfEncoder::Amf3(w) => w.into_inner(),
    };
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CallOutcome;

    #[test]
    fn set_chunk_size_message_type_and_body() {
        let body = MessageBody::SetChunkSize { new_chunk_size: 4096 };
        assert_eq!(body.message_type(), 1);
        assert_eq!(compose(&body).unwrap(), vec![0x00, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn command_amf3_gets_leading_pad_byte() {
        let command = Command::notify("onStatus", vec![]);
        let body = MessageBody::CommandAmf3(command);
        let bytes = compose(&body).unwrap();
        assert_eq!(bytes[0], 0x00);
    }

    #[test]
    fn data_amf3_has_no_leading_pad_byte() {
        let command = Command::notify("onStatus", vec![]);
        let body = MessageBody::DataAmf3(command);
        let bytes = compose(&body).unwrap();
        // Method name is a non-empty string; AMF3 String marker is 0x06.
        assert_eq!(bytes[0], 0x06);
    }

    #[test]
    fn shared_object_is_an_empty_stub() {
        assert_eq!(compose(&MessageBody::SharedObjectAmf0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn invoke_failure_substitutes_status_argument() {
        let command = Command::response("_error", 1.0, CallOutcome::Failure, vec![Value::Null]);
        let body = MessageBody::CommandAmf0(command);
        let bytes = compose(&body).unwrap();
        assert!(bytes.contains(&0x03)); // AMF0 Object marker for the status object
    }
}
