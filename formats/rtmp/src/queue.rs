///! @see: SPEC_FULL.md section 4.8 (C8), outgoing queue.
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use crossbeam_utils::atomic::AtomicCell;
use thiserror::Error;

use crate::chunk::{ChunkWriteError, ChunkWriter, RtmpHeader};

/// One fully-composed message awaiting the chunk writer: the header C7
/// needs to pick a format against its previous-header cache, plus the body
/// C6 already built on a scratch sink. @see SPEC_FULL.md section 2 data flow.
#[derive(Debug)]
pub struct Packet {
    pub header: RtmpHeader,
    pub body: Vec<u8>,
}

/// An I/O error trips the loop permanently; @see SPEC_FULL.md section 4.7
/// failure semantics and section 5, "Cancellation": no mid-packet rollback
/// is attempted, and the connection this queue serves must be closed.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("writer loop already disconnected, not restartable")]
    AlreadyDisconnected,
    #[error("chunk write failed: {0}")]
    Chunk(#[from] ChunkWriteError),
}

/// A lock-free multi-producer/single-consumer FIFO with a single-bit
/// "packet available" signal, exactly as SPEC_FULL.md section 4.8
/// describes. `SegQueue` gives the FIFO itself; `AtomicCell<bool>` is the
/// signal the drain loop test-and-clears.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    packets: SegQueue<Packet>,
    available: AtomicCell<bool>,
    disconnected: AtomicCell<bool>,
}

impl OutgoingQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Producer side: any number of threads may call this concurrently.
    pub fn enqueue(&self, packet: Packet) {
        self.packets.push(packet);
        self.available.store(true);
    }

    /// Consumer side: the single drain loop thread/task. Test-and-clears
    /// the signal bit; an empty return means the caller should park.
    /// Packets sharing a chunk-stream id come out in enqueue order because
    /// `SegQueue` itself is FIFO; this method never reorders within a
    /// stream, only reports what was observed available at the time of
    /// the call.
    pub fn drain(&self) -> Vec<Packet> {
        if !self.available.swap(false) {
            return Vec::new();
        }
        let mut drained = Vec::new();
        while let Some(packet) = self.packets.pop() {
            drained.push(packet);
        }
        // A producer may have enqueued (and re-signaled) after our last
        // successful pop but before we observe the queue as empty; leave
        // the bit set in that case so the next drain doesn't miss it.
        if !self.packets.is_empty() {
            self.available.store(true);
        }
        drained
    }

    pub fn is_signaled(&self) -> bool {
        self.available.load()
    }

    pub fn len_hint(&self) -> usize {
        self.packets.len()
    }

    /// True once an I/O error has tripped `drive`. Observers (the session
    /// layer) poll this to learn the writer loop raised a Disconnected
    /// signal and stopped; @see SPEC_FULL.md section 7, the `Transport`
    /// error kind.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load()
    }

    /// One iteration of the signal-driven drain loop: dequeues everything
    /// currently available and hands each packet's header and body to
    /// `writer`, which selects the chunk format against its previous-header
    /// cache and fragments the body through the byte sink (@see
    /// SPEC_FULL.md section 4.7). Returns the count of packets written.
    ///
    /// The first I/O error trips `disconnected` permanently: the spec
    /// requires the writer loop to stop and never restart once a packet
    /// has been partially emitted, so every subsequent `drive` call fails
    /// fast without touching the sink again.
    pub fn drive<W: std::io::Write>(&self, writer: &mut ChunkWriter<W>) -> Result<usize, DriveError> {
        if self.disconnected.load() {
            return Err(DriveError::AlreadyDisconnected);
        }
        let packets = self.drain();
        let mut written = 0;
        for packet in packets {
            if let Err(err) = writer.write_message(packet.header, &packet.body) {
                self.disconnected.store(true);
                tracing::error!(error = %err, "chunk writer disconnected mid-loop");
                return Err(err.into());
            }
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(chunk_stream_id: u32, byte: u8) -> Packet {
        Packet {
            header: RtmpHeader::new(chunk_stream_id, 1, 0x14, 0),
            body: vec![byte],
        }
    }

    #[test]
    fn drain_returns_empty_without_a_signal() {
        let queue = OutgoingQueue::new();
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn enqueue_then_drain_preserves_fifo_order_per_stream() {
        let queue = OutgoingQueue::new();
        for i in 0..5 {
            queue.enqueue(packet(3, i));
        }
        let drained = queue.drain();
        let order: Vec<u8> = drained.iter().map(|p| p.body[0]).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn drain_clears_the_signal() {
        let queue = OutgoingQueue::new();
        queue.enqueue(packet(1, 0));
        queue.drain();
        assert!(!queue.is_signaled());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn concurrent_producers_all_land() {
        use std::thread;
        let queue = OutgoingQueue::new();
        let mut handles = Vec::new();
        for producer in 0..4u32 {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..25u8 {
                    queue.enqueue(packet(producer, i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), 100);
    }

    #[test]
    fn drive_writes_queued_packets_through_the_chunk_writer() {
        let queue = OutgoingQueue::new();
        queue.enqueue(packet(3, 0xAA));
        let mut writer = ChunkWriter::new(Vec::new());
        let count = queue.drive(&mut writer).unwrap();
        assert_eq!(count, 1);
        assert!(!writer.into_inner().is_empty());
    }

    #[test]
    fn drive_trips_disconnected_on_io_error_and_never_recovers() {
        struct FailingWriter;
        impl std::io::Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let queue = OutgoingQueue::new();
        queue.enqueue(packet(3, 0xAA));
        let mut writer = ChunkWriter::new(FailingWriter);
        assert!(queue.drive(&mut writer).is_err());
        assert!(queue.is_disconnected());

        queue.enqueue(packet(3, 0xBB));
        assert!(matches!(queue.drive(&mut writer), Err(DriveError::AlreadyDisconnected)));
    }
}
