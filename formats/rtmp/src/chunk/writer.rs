///! @see: SPEC_FULL.md section 4.7 (C7), RTMP chunk writer.
use std::collections::HashMap;
use std::io::Write;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use utils::sink::ByteSink;

use super::consts::{ChunkHeaderFormat, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP_MARKER, EXTENDED_TIMESTAMP_THRESHOLD};
use super::errors::{ChunkWriteError, ChunkWriteResult};

/// A message-level header, independent of how it is ultimately chunked.
/// @see SPEC_FULL.md section 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtmpHeader {
    pub chunk_stream_id: u32,
    pub message_stream_id: u32,
    pub message_type: u8,
    pub timestamp: u32,
    pub packet_length: u32,
    pub is_timer_relative: bool,
}

impl RtmpHeader {
    pub fn new(chunk_stream_id: u32, message_stream_id: u32, message_type: u8, timestamp: u32) -> Self {
        Self {
            chunk_stream_id,
            message_stream_id,
            message_type,
            timestamp,
            packet_length: 0,
            is_timer_relative: true,
        }
    }
}

fn write_u24<W: Write>(sink: &mut W, value: u32) -> ChunkWriteResult<()> {
    sink.write_u8(((value >> 16) & 0xFF) as u8)?;
    sink.write_u8(((value >> 8) & 0xFF) as u8)?;
    sink.write_u8((value & 0xFF) as u8)?;
    Ok(())
}

/// Writes the 24-bit timestamp/delta field, escaping to `0xFFFFFF` and
/// returning the full value for the 32-bit trailer when it saturates.
fn write_timestamp_field<W: Write>(sink: &mut W, value: u32) -> ChunkWriteResult<Option<u32>> {
    if value >= EXTENDED_TIMESTAMP_THRESHOLD {
        write_u24(sink, EXTENDED_TIMESTAMP_MARKER)?;
        Ok(Some(value))
    } else {
        write_u24(sink, value)?;
        Ok(None)
    }
}

/// Basic header: format (2 bits) + chunk-stream id, 1/2/3 bytes depending
/// on range. @see SPEC_FULL.md section 4.7.
fn write_basic_header<W: Write>(sink: &mut W, format: ChunkHeaderFormat, csid: u32) -> ChunkWriteResult<()> {
    let f = (format as u8) << 6;
    if csid <= 63 {
        sink.write_u8(f | csid as u8)?;
    } else if csid <= 319 {
        sink.write_u8(f)?;
        sink.write_u8((csid - 64) as u8)?;
    } else if csid <= 64 + 0xFFFF {
        sink.write_u8(f | 1)?;
        let rel = csid - 64;
        sink.write_u8((rel & 0xFF) as u8)?;
        sink.write_u8((rel >> 8) as u8)?;
    } else {
        return Err(ChunkWriteError::ChunkStreamIdOutOfRange(csid));
    }
    Ok(())
}

fn select_format(previous: Option<&RtmpHeader>, header: &RtmpHeader) -> ChunkHeaderFormat {
    let Some(previous) = previous else {
        return ChunkHeaderFormat::New;
    };
    if header.message_stream_id != previous.message_stream_id || !header.is_timer_relative {
        ChunkHeaderFormat::New
    } else if header.packet_length != previous.packet_length || header.message_type != previous.message_type {
        ChunkHeaderFormat::SameSource
    } else if header.timestamp != previous.timestamp {
        ChunkHeaderFormat::TimestampAdjustment
    } else {
        ChunkHeaderFormat::Continuation
    }
}

/// Writes the message header fields for `format`, returning the absolute
/// timestamp value if it escaped to the extended trailer.
fn write_message_header<W: Write>(
    sink: &mut W,
    format: ChunkHeaderFormat,
    header: &RtmpHeader,
    previous: Option<&RtmpHeader>,
) -> ChunkWriteResult<Option<u32>> {
    match format {
        ChunkHeaderFormat::New => {
            let extended = write_timestamp_field(sink, header.timestamp)?;
            write_u24(sink, header.packet_length)?;
            sink.write_u8(header.message_type)?;
            sink.write_i32::<LittleEndian>(header.message_stream_id as i32)?;
            Ok(extended)
        }
        ChunkHeaderFormat::SameSource => {
            let prev_ts = previous.map(|p| p.timestamp).unwrap_or(0);
            let delta = header.timestamp.wrapping_sub(prev_ts);
            let extended = write_timestamp_field(sink, delta)?;
            write_u24(sink, header.packet_length)?;
            sink.write_u8(header.message_type)?;
            Ok(extended)
        }
        ChunkHeaderFormat::TimestampAdjustment => {
            let prev_ts = previous.map(|p| p.timestamp).unwrap_or(0);
            let delta = header.timestamp.wrapping_sub(prev_ts);
            write_timestamp_field(sink, delta)
        }
        ChunkHeaderFormat::Continuation => Ok(None),
    }
}

/// Per-connection chunk writer: one previous-header cache keyed by
/// chunk-stream id, and a write chunk size shared across all streams.
/// @see SPEC_FULL.md section 4.7.
#[derive(Debug)]
pub struct ChunkWriter<W> {
    sink: W,
    previous: HashMap<u32, RtmpHeader>,
    write_chunk_size: u32,
    pending_chunk_size: Option<u32>,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            previous: HashMap::new(),
            write_chunk_size: DEFAULT_CHUNK_SIZE,
            pending_chunk_size: None,
        }
    }

    pub fn write_chunk_size(&self) -> u32 {
        self.write_chunk_size
    }

    /// Requests a chunk-size change that takes effect only after the
    /// message currently being written finishes fragmenting. Call this
    /// alongside enqueuing a `SetChunkSize` message whose body carries the
    /// same value.
    pub fn queue_chunk_size_update(&mut self, new_size: u32) {
        self.pending_chunk_size = Some(new_size);
    }

    /// Writes one RTMP message as a header followed by `writeChunkSize`
    /// fragments, each continuation fragment prefixed by a Type-3 basic
    /// header. @see SPEC_FULL.md section 4.7, "Fragmentation".
    pub fn write_message(&mut self, mut header: RtmpHeader, body: &[u8]) -> ChunkWriteResult<()> {
        if body.len() > 0xFF_FFFF {
            return Err(ChunkWriteError::PacketLengthOutOfRange(body.len() as u32));
        }
        header.packet_length = body.len() as u32;

        let previous = self.previous.get(&header.chunk_stream_id).copied();
        let format = select_format(previous.as_ref(), &header);

        write_basic_header(&mut self.sink, format, header.chunk_stream_id)?;
        let extended = write_message_header(&mut self.sink, format, &header, previous.as_ref())?;
        if let Some(absolute) = extended {
            self.sink.write_u32::<BigEndian>(absolute)?;
        }

        let chunk_size = self.write_chunk_size as usize;
        let mut offset = 0usize;
        while offset < body.len() {
            if offset > 0 {
                write_basic_header(&mut self.sink, ChunkHeaderFormat::Continuation, header.chunk_stream_id)?;
            }
            let take = chunk_size.min(body.len() - offset);
            self.sink.write_all(&body[offset..offset + take])?;
            offset += take;
        }

        self.previous.insert(header.chunk_stream_id, header);
        if let Some(new_size) = self.pending_chunk_size.take() {
            self.write_chunk_size = new_size;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

impl<W: Write> ChunkWriter<ByteSink<W>> {
    /// Builds a chunk writer over a buffered `ByteSink`: bytes accumulate
    /// in memory until `flush` sends them to `inner` as one write, the
    /// mode the async transport side of SPEC_FULL.md section 4.1 expects.
    pub fn buffered(inner: W) -> Self {
        Self::new(ByteSink::buffered(inner))
    }

    /// Builds a chunk writer that writes straight through to `inner`.
    pub fn synchronous(inner: W) -> Self {
        Self::new(ByteSink::synchronous(inner))
    }

    /// Flushes the underlying `ByteSink`'s scratch buffer. Only valid when
    /// this writer was built via `buffered`; `synchronous` sinks reject it
    /// with `InvalidMode`.
    pub fn flush(&mut self) -> ChunkWriteResult<()> {
        Ok(self.sink.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_header_single_byte() {
        let mut buf = Vec::new();
        write_basic_header(&mut buf, ChunkHeaderFormat::New, 3).unwrap();
        assert_eq!(buf, vec![0x03]);
    }

    #[test]
    fn basic_header_three_byte_form() {
        let mut buf = Vec::new();
        write_basic_header(&mut buf, ChunkHeaderFormat::New, 320).unwrap();
        // (f<<6)|1, then (s-64)&0xFF, then (s-64)>>8; s-64 = 256.
        assert_eq!(buf, vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn basic_header_two_byte_form() {
        let mut buf = Vec::new();
        write_basic_header(&mut buf, ChunkHeaderFormat::New, 64).unwrap();
        assert_eq!(buf, vec![0x00, 0x00]);
    }

    #[test]
    fn type0_header_matches_worked_scenario() {
        let mut writer = ChunkWriter::new(Vec::new());
        let header = RtmpHeader::new(3, 1, 0x14, 0);
        writer.write_message(header, &[0u8; 17]).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(
            &bytes[..12],
            &[0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x11, 0x14, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn buffered_writer_requires_explicit_flush() {
        let mut writer = ChunkWriter::buffered(Vec::new());
        let header = RtmpHeader::new(3, 1, 0x14, 0);
        writer.write_message(header, &[0u8; 4]).unwrap();
        assert!(!writer.get_ref().scratch().is_empty());
        writer.flush().unwrap();
    }

    #[test]
    fn synchronous_writer_rejects_flush() {
        let mut writer = ChunkWriter::synchronous(Vec::new());
        assert!(writer.flush().is_err());
    }

    #[test]
    fn repeated_identical_headers_compress_to_continuation() {
        let mut writer = ChunkWriter::new(Vec::new());
        let header = RtmpHeader::new(3, 1, 0x14, 0);
        writer.write_message(header, &[0u8; 4]).unwrap();
        writer.write_message(header, &[0u8; 4]).unwrap();
        let bytes = writer.into_inner();
        // Second message's basic header is a single byte: (3<<6)|3.
        let second_basic_header_index = 1 /*basic*/ + 11 /*new header fields*/ + 4 /*body*/;
        assert_eq!(bytes[second_basic_header_index], (3u8 << 6) | 3);
    }

    #[test]
    fn chunk_size_update_is_deferred_to_next_message() {
        let mut writer = ChunkWriter::new(Vec::new());
        writer.queue_chunk_size_update(4);
        let header = RtmpHeader::new(3, 1, 0x01, 0);
        writer.write_message(header, &[0xAA; 10]).unwrap();
        // The SetChunkSize message itself is still fragmented at 128.
        assert_eq!(writer.write_chunk_size(), 4);

        let next = RtmpHeader {
            is_timer_relative: false,
            ..RtmpHeader::new(3, 1, 0x09, 0)
        };
        writer.write_message(next, &[0xBBu8; 10]).unwrap();
        let bytes = writer.into_inner();
        // Two fragments of 4 bytes for the second message's 10-byte body
        // (4 + continuation-header + 4 + continuation-header + 2).
        assert!(bytes.len() > 10);
    }

    #[test]
    fn extended_timestamp_escapes_and_appends_trailer() {
        let mut writer = ChunkWriter::new(Vec::new());
        let header = RtmpHeader::new(5, 1, 0x09, 0x0100_0000);
        writer.write_message(header, &[0u8; 1]).unwrap();
        let bytes = writer.into_inner();
        // basic(1) + ts(3)=FFFFFF + len(3) + type(1) + msid(4) + trailer(4)
        assert_eq!(&bytes[1..4], &[0xFF, 0xFF, 0xFF]);
        let trailer_offset = 1 + 3 + 3 + 1 + 4;
        assert_eq!(
            u32::from_be_bytes(bytes[trailer_offset..trailer_offset + 4].try_into().unwrap()),
            0x0100_0000
        );
    }
}
