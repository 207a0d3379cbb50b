//! Compressor-side driver: payload chunks in, framed blocks out.

use std::io;

use crossbeam_channel::{Receiver, Sender};

use crate::block::compress::BlockCompressor;
use crate::block::types::CodecError;

/// Drives a [`BlockCompressor`] between two channel endpoints.
///
/// Every non-empty chunk received from upstream becomes exactly one frame on
/// downstream — chunking is not normalized, so many small input chunks
/// produce many small frames.  When upstream disconnects, the end-of-stream
/// frame is emitted and downstream is closed by dropping the sender.
pub struct StreamCompressor {
    block: BlockCompressor,
}

impl StreamCompressor {
    pub fn new(block: BlockCompressor) -> Self {
        StreamCompressor { block }
    }

    /// Process the stream to completion.
    ///
    /// Blocks on `upstream.recv()` for the next chunk and on
    /// `downstream.send()` for backpressure; these are the only suspension
    /// points.  Frames are emitted strictly in input order.  Returns the
    /// number of frames emitted, including the sentinel.
    ///
    /// # Errors
    ///
    /// [`CodecError::Downstream`] when the consumer hangs up before the
    /// stream completes.  Both channel ends are dropped on every exit path,
    /// closing both sides of the pipeline.
    pub fn run(
        mut self,
        upstream: Receiver<Vec<u8>>,
        downstream: Sender<Vec<u8>>,
    ) -> Result<u64, CodecError> {
        let mut frames = 0u64;
        while let Ok(chunk) = upstream.recv() {
            if chunk.is_empty() {
                continue;
            }
            let frame = self.block.compress(&chunk);
            // The input buffer is released before waiting on the consumer.
            drop(chunk);
            send(&downstream, frame)?;
            frames += 1;
        }
        // Upstream disconnect is the end-of-input signal.
        send(&downstream, self.block.end_of_stream())?;
        Ok(frames + 1)
    }
}

fn send(downstream: &Sender<Vec<u8>>, frame: Vec<u8>) -> Result<(), CodecError> {
    downstream.send(frame).map_err(|_| {
        CodecError::Downstream(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "consumer disconnected",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::types::{read_le32, HEADER_LENGTH, MAGIC, ORIGINAL_LEN_OFFSET};
    use crossbeam_channel::unbounded;

    fn run_with_chunks(chunks: Vec<Vec<u8>>) -> (u64, Vec<Vec<u8>>) {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for chunk in chunks {
            in_tx.send(chunk).unwrap();
        }
        drop(in_tx);
        let frames = StreamCompressor::new(BlockCompressor::fast())
            .run(in_rx, out_tx)
            .unwrap();
        (frames, out_rx.into_iter().collect())
    }

    #[test]
    fn one_frame_per_chunk_plus_sentinel() {
        let (count, frames) = run_with_chunks(vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(count, 3);
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(&frame[..8], &MAGIC);
        }
        assert_eq!(frames[2].len(), HEADER_LENGTH);
        assert_eq!(read_le32(&frames[2], ORIGINAL_LEN_OFFSET), 0);
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let (count, frames) = run_with_chunks(vec![Vec::new(), b"data".to_vec(), Vec::new()]);
        assert_eq!(count, 2);
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn empty_input_emits_only_the_sentinel() {
        let (count, frames) = run_with_chunks(Vec::new());
        assert_eq!(count, 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), HEADER_LENGTH);
    }

    #[test]
    fn hung_up_consumer_is_a_downstream_error() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded::<Vec<u8>>();
        in_tx.send(b"chunk".to_vec()).unwrap();
        drop(in_tx);
        drop(out_rx);
        let err = StreamCompressor::new(BlockCompressor::fast())
            .run(in_rx, out_tx)
            .unwrap_err();
        assert!(matches!(err, CodecError::Downstream(_)));
    }
}
