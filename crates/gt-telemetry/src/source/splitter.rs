//! Recover frame boundaries from a concatenated capture stream.
//!
//! Captures carry no length prefix; every frame starts with the magic word, so
//! the magic doubles as a delimiter. The splitter consumes a magic at the head
//! of its buffer, then emits everything up to the next magic (or the end of
//! the stream) with the magic put back in front.

use std::io::{self, Read};

use gt_telemetry_protocol::MAGIC_BYTES;

const READ_CHUNK: usize = 4096;

/// Splits a byte stream into magic-prefixed frames.
#[derive(Debug)]
pub struct FrameSplitter<R> {
    reader: R,
    buf: Vec<u8>,
    eof: bool,
    frames: u64,
}

fn find_magic(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(MAGIC_BYTES.len())
        .position(|window| window == MAGIC_BYTES)
}

fn with_magic(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MAGIC_BYTES.len() + body.len());
    frame.extend_from_slice(&MAGIC_BYTES);
    frame.extend_from_slice(body);
    frame
}

impl<R: Read> FrameSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(READ_CHUNK * 2),
            eof: false,
            frames: 0,
        }
    }

    /// Frames emitted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Next frame, or `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the underlying reader.
    pub fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if self.buf.starts_with(&MAGIC_BYTES) {
                self.buf.drain(..MAGIC_BYTES.len());
                continue;
            }

            if let Some(pos) = find_magic(&self.buf) {
                let frame = with_magic(self.buf.get(..pos).unwrap_or_default());
                self.buf.drain(..pos);
                self.frames += 1;
                return Ok(Some(frame));
            }

            if !self.eof {
                self.fill()?;
                continue;
            }

            if self.buf.is_empty() {
                return Ok(None);
            }
            let frame = with_magic(&self.buf);
            self.buf.clear();
            self.frames += 1;
            return Ok(Some(frame));
        }
    }
}

impl<R: Read> Iterator for FrameSplitter<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
