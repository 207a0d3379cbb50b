//! Decompressor-side driver: framed blocks in, payload chunks out.

use std::io;

use crossbeam_channel::{Receiver, Sender};

use crate::block::decompress::{Block, BlockDecompressor};
use crate::block::types::CodecError;
use crate::queue::ByteQueue;

/// Passive observer of decoder progress, for accounting only.
///
/// The driver calls an inspector after each frame is fully validated;
/// implementations must not affect control flow.
pub trait Inspector {
    /// One data frame was decoded: `consumed` wire bytes produced `payload`.
    fn on_block(&mut self, consumed: usize, payload: &[u8]);
    /// The end-of-stream frame was consumed (`consumed` wire bytes).
    fn on_end_of_stream(&mut self, consumed: usize);
}

/// Drives a [`BlockDecompressor`] between two channel endpoints.
///
/// Incoming chunks are accumulated in a [`ByteQueue`]; on each arrival every
/// complete frame already buffered is decoded and its payload emitted
/// downstream, in wire order.  The end-of-stream frame must be the last
/// bytes of the stream: anything after it — buffered or still arriving — is
/// [`CodecError::UnexpectedTrailingData`], and an upstream disconnect before
/// it is [`CodecError::Corrupted`].
pub struct StreamDecompressor {
    block: BlockDecompressor,
    inspector: Option<Box<dyn Inspector>>,
}

impl StreamDecompressor {
    pub fn new(block: BlockDecompressor) -> Self {
        StreamDecompressor {
            block,
            inspector: None,
        }
    }

    /// Attach a passive inspector.
    pub fn with_inspector(mut self, inspector: Box<dyn Inspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Process the stream to completion.
    ///
    /// Blocks on `upstream.recv()` for input and on `downstream.send()` for
    /// backpressure.  Between suspensions, every frame already buffered is
    /// processed.
    ///
    /// # Errors
    ///
    /// Any [`CodecError`]; all are terminal, and both channel ends are
    /// dropped on every exit path, closing both sides of the pipeline.
    pub fn run(
        mut self,
        upstream: Receiver<Vec<u8>>,
        downstream: Sender<Vec<u8>>,
    ) -> Result<(), CodecError> {
        let mut queue = ByteQueue::new();
        loop {
            // Drain every complete frame already buffered.
            loop {
                let before = queue.remaining_bytes();
                match self.block.try_decompress(&mut queue)? {
                    None => break,
                    Some(Block::Data(payload)) => {
                        let consumed = before - queue.remaining_bytes();
                        if let Some(inspector) = self.inspector.as_deref_mut() {
                            inspector.on_block(consumed, &payload);
                        }
                        downstream.send(payload).map_err(|_| {
                            CodecError::Downstream(io::Error::new(
                                io::ErrorKind::BrokenPipe,
                                "consumer disconnected",
                            ))
                        })?;
                    }
                    Some(Block::EndOfStream) => {
                        let consumed = before - queue.remaining_bytes();
                        if let Some(inspector) = self.inspector.as_deref_mut() {
                            inspector.on_end_of_stream(consumed);
                        }
                        return finish(&queue, &upstream);
                    }
                }
            }

            match upstream.recv() {
                Ok(chunk) => queue.push(chunk),
                Err(_) => {
                    return Err(CodecError::Corrupted(
                        "stream ended before end-of-stream block",
                    ))
                }
            }
        }
    }
}

/// After the sentinel: the queue must be empty and upstream must have
/// nothing further to say before it disconnects.
fn finish(queue: &ByteQueue, upstream: &Receiver<Vec<u8>>) -> Result<(), CodecError> {
    if !queue.is_empty() {
        return Err(CodecError::UnexpectedTrailingData);
    }
    loop {
        match upstream.recv() {
            Ok(chunk) if chunk.is_empty() => continue,
            Ok(_) => return Err(CodecError::UnexpectedTrailingData),
            Err(_) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::compress::BlockCompressor;
    use crossbeam_channel::unbounded;

    fn decode_chunks(chunks: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, CodecError> {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for chunk in chunks {
            in_tx.send(chunk).unwrap();
        }
        drop(in_tx);
        StreamDecompressor::new(BlockDecompressor::new()).run(in_rx, out_tx)?;
        Ok(out_rx.into_iter().collect())
    }

    #[test]
    fn payloads_emitted_in_wire_order() {
        let mut enc = BlockCompressor::fast();
        let mut chunks = vec![enc.compress(b"first"), enc.compress(b"second")];
        chunks.push(enc.end_of_stream());

        let payloads = decode_chunks(chunks).unwrap();
        assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn truncated_stream_is_corrupted() {
        let mut enc = BlockCompressor::fast();
        let frame = enc.compress(b"only a data frame, no sentinel");
        let err = decode_chunks(vec![frame]).unwrap_err();
        assert!(matches!(err, CodecError::Corrupted(_)));
    }

    #[test]
    fn bytes_after_sentinel_are_trailing_data() {
        let mut enc = BlockCompressor::fast();
        let mut stream = enc.compress(b"TestData");
        stream.extend_from_slice(&enc.end_of_stream());
        stream.extend_from_slice(&[0u8; 10]);

        let err = decode_chunks(vec![stream]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedTrailingData));
    }

    #[test]
    fn late_chunk_after_sentinel_is_trailing_data() {
        let mut enc = BlockCompressor::fast();
        let chunks = vec![
            enc.compress(b"TestData"),
            enc.end_of_stream(),
            b"straggler".to_vec(),
        ];
        let err = decode_chunks(chunks).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedTrailingData));
    }

    #[test]
    fn empty_chunks_after_sentinel_are_harmless() {
        let mut enc = BlockCompressor::fast();
        let chunks = vec![enc.end_of_stream(), Vec::new(), Vec::new()];
        assert!(decode_chunks(chunks).unwrap().is_empty());
    }

    /// Counts shared with the test body through `Rc`, since the driver
    /// consumes the boxed inspector.
    #[derive(Default)]
    struct Counting(Rc<RefCell<Totals>>);

    #[derive(Default)]
    struct Totals {
        blocks: usize,
        consumed: usize,
        payload_bytes: usize,
        end_consumed: Option<usize>,
    }

    use std::cell::RefCell;
    use std::rc::Rc;

    impl Inspector for Counting {
        fn on_block(&mut self, consumed: usize, payload: &[u8]) {
            let mut t = self.0.borrow_mut();
            t.blocks += 1;
            t.consumed += consumed;
            t.payload_bytes += payload.len();
        }
        fn on_end_of_stream(&mut self, consumed: usize) {
            self.0.borrow_mut().end_consumed = Some(consumed);
        }
    }

    #[test]
    fn inspector_accounts_for_every_wire_byte() {
        let mut enc = BlockCompressor::fast();
        let frames = vec![
            enc.compress(b"alpha"),
            enc.compress(&vec![b'r'; 2048]),
            enc.end_of_stream(),
        ];
        let wire_len: usize = frames.iter().map(Vec::len).sum();

        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for frame in frames {
            in_tx.send(frame).unwrap();
        }
        drop(in_tx);

        let totals = Rc::new(RefCell::new(Totals::default()));
        StreamDecompressor::new(BlockDecompressor::new())
            .with_inspector(Box::new(Counting(Rc::clone(&totals))))
            .run(in_rx, out_tx)
            .unwrap();

        let payloads: Vec<Vec<u8>> = out_rx.into_iter().collect();
        let totals = totals.borrow();
        assert_eq!(totals.blocks, 2);
        assert_eq!(totals.end_consumed, Some(21));
        assert_eq!(totals.consumed + 21, wire_len);
        assert_eq!(
            totals.payload_bytes,
            payloads.iter().map(Vec::len).sum::<usize>()
        );
    }
}
