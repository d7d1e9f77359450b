///! @see: SPEC_FULL.md 4.1 Byte Sink (C1)
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("operation not valid for the sink's fixed mode")]
    InvalidMode,
}

pub type SinkResult<T> = Result<T, SinkError>;

/// A sink is fixed to one mode for its whole lifetime: `Synchronous` writes
/// land on the underlying stream immediately, `Buffered` appends to a
/// scratch buffer the caller must `flush` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Synchronous,
    Buffered,
}

#[derive(Debug)]
pub struct ByteSink<W> {
    mode: SinkMode,
    scratch: Vec<u8>,
    underlying: W,
}

impl<W: io::Write> ByteSink<W> {
    pub fn synchronous(underlying: W) -> Self {
        Self {
            mode: SinkMode::Synchronous,
            scratch: Vec::new(),
            underlying,
        }
    }

    pub fn buffered(underlying: W) -> Self {
        Self {
            mode: SinkMode::Buffered,
            scratch: Vec::with_capacity(4096),
            underlying,
        }
    }

    pub fn mode(&self) -> SinkMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.underlying
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.underlying
    }

    fn write_raw(&mut self, bytes: &[u8]) -> SinkResult<()> {
        match self.mode {
            SinkMode::Synchronous => self.underlying.write_all(bytes).map_err(SinkError::Io),
            SinkMode::Buffered => {
                self.scratch.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    pub fn write_byte(&mut self, value: u8) -> SinkResult<()> {
        self.write_raw(&[value])
    }

    pub fn write_bytes(&mut self, buffer: &[u8], offset: usize, length: usize) -> SinkResult<()> {
        self.write_raw(&buffer[offset..offset + length])
    }

    pub fn write_u16_be(&mut self, value: u16) -> SinkResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_u24_be(&mut self, value: u32) -> SinkResult<()> {
        let bytes = value.to_be_bytes();
        self.write_raw(&bytes[1..4])
    }

    pub fn write_u32_be(&mut self, value: u32) -> SinkResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_i32_be(&mut self, value: i32) -> SinkResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    /// The RTMP "reverse int": a 32-bit value in little-endian byte order,
    /// used only for the chunk message-stream id.
    pub fn write_i32_le(&mut self, value: i32) -> SinkResult<()> {
        self.write_raw(&value.to_le_bytes())
    }

    pub fn write_f64_be(&mut self, value: f64) -> SinkResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_f32_be(&mut self, value: f32) -> SinkResult<()> {
        self.write_raw(&value.to_be_bytes())
    }

    /// Flushes the scratch buffer to the underlying stream as a single
    /// write. Only valid in `Buffered` mode; the sole suspension point of
    /// the async path (@see SPEC_FULL.md section 5).
    pub fn flush(&mut self) -> SinkResult<()> {
        match self.mode {
            SinkMode::Synchronous => Err(SinkError::InvalidMode),
            SinkMode::Buffered => {
                self.underlying.write_all(&self.scratch)?;
                self.scratch.clear();
                Ok(())
            }
        }
    }

    /// The bytes accumulated so far in `Buffered` mode, without flushing.
    pub fn scratch(&self) -> &[u8] {
        match self.mode {
            SinkMode::Synchronous => &[],
            SinkMode::Buffered => &self.scratch,
        }
    }
}

/// `io::Write` is the only capability a caller-supplied type needs for the
/// synchronous family; this blanket impl lets a `ByteSink<Vec<u8>>` serve as
/// an AMF scratch sink the same way it serves as a chunk transport sink.
impl<W: io::Write> io::Write for ByteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_raw(buf)
            .map(|_| buf.len())
            .map_err(|e| match e {
                SinkError::Io(e) => e,
                SinkError::InvalidMode => {
                    io::Error::new(io::ErrorKind::Other, "sink mode mismatch")
                }
            })
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.mode {
            SinkMode::Synchronous => self.underlying.flush(),
            SinkMode::Buffered => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronous_writes_land_immediately() {
        let mut sink = ByteSink::synchronous(Vec::new());
        sink.write_u24_be(0x11).unwrap();
        sink.write_i32_le(1).unwrap();
        assert_eq!(sink.into_inner(), vec![0x00, 0x00, 0x11, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn buffered_requires_explicit_flush() {
        let mut sink = ByteSink::buffered(Vec::new());
        sink.write_byte(0xAB).unwrap();
        assert!(sink.inner_mut().is_empty());
        sink.flush().unwrap();
        assert_eq!(sink.inner_mut(), &vec![0xAB]);
    }

    #[test]
    fn flush_on_synchronous_sink_is_invalid_mode() {
        let mut sink = ByteSink::synchronous(Vec::new());
        assert!(matches!(sink.flush(), Err(SinkError::InvalidMode)));
    }
}
