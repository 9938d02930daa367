//! Concurrent streaming engine.
//!
//! Stages are chained through conduits: bounded, blocking, single-producer
//! single-consumer byte channels. Each appended stage starts running on its
//! own thread immediately; the invoking thread performs only the final
//! blocking drain. The bounded buffers provide backpressure up the whole
//! chain, and dropping a conduit's write end signals end-of-stream to the
//! reader on every exit path.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{Error, FilterError};

/// A stream transform: consume an input byte stream, produce an output byte
/// stream, possibly fail with a stage-local error.
pub type Transform =
    Box<dyn FnOnce(Box<dyn BufRead + Send>, &mut dyn Write) -> Result<(), FilterError> + Send>;

/// Chunks buffered per conduit before a writer blocks.
const CONDUIT_CAPACITY: usize = 64;

/// Creates a connected conduit pair.
fn conduit() -> (ConduitWriter, ConduitReader) {
    let (tx, rx) = sync_channel(CONDUIT_CAPACITY);
    (
        ConduitWriter { tx },
        ConduitReader {
            rx,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

struct ConduitWriter {
    tx: SyncSender<Vec<u8>>,
}

impl Write for ConduitWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "downstream stage stopped reading"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct ConduitReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Read for ConduitReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.offset == self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                // Writer gone: end of stream.
                Err(_) => return Ok(0),
            }
        }
        let n = (self.pending.len() - self.offset).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

/// A pipeline under construction and execution.
///
/// `push` appends a stage and starts it immediately; `drain` copies the final
/// stage's output to the destination sink and reports the run's outcome.
pub struct Pipeline {
    head: Box<dyn Read + Send>,
    error: Arc<Mutex<Option<FilterError>>>,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(source: impl Read + Send + 'static) -> Self {
        Self {
            head: Box::new(source),
            error: Arc::new(Mutex::new(None)),
            handles: Vec::new(),
        }
    }

    /// Appends a transform and launches it on its own thread, reading from
    /// the previous stage's output and writing to a fresh conduit.
    ///
    /// A failing transform stores its error in the shared cell; the first
    /// error wins. A `BrokenPipe` failure means the downstream stage stopped
    /// reading on purpose and counts as clean termination.
    pub fn push(&mut self, transform: Transform) {
        let (writer, reader) = conduit();
        let upstream = std::mem::replace(&mut self.head, Box::new(reader));
        let cell = Arc::clone(&self.error);

        let handle = thread::spawn(move || {
            let input: Box<dyn BufRead + Send> = Box::new(BufReader::new(upstream));
            let mut output = BufWriter::new(writer);

            let result = transform(input, &mut output)
                .and_then(|()| output.flush().map_err(FilterError::from));

            if let Err(err) = result
                && !is_broken_pipe(&err)
            {
                set_first_error(&cell, err);
            }
            // The conduit writer is dropped here on every path, so the
            // downstream reader always observes end-of-stream.
        });

        self.handles.push(handle);
    }

    /// Blocking copy from the final stage's output to `output`.
    ///
    /// Joins every stage thread before reporting, then returns the first
    /// stage error if any was recorded, otherwise the drain's own I/O error,
    /// otherwise the number of bytes written.
    pub fn drain(self, output: &mut dyn Write) -> Result<u64, Error> {
        let Pipeline {
            mut head,
            error,
            handles,
        } = self;

        let copied = io::copy(&mut head, output);

        // Dropping the final read end unblocks any stage still writing; the
        // resulting broken-pipe failures cascade up and every thread exits.
        drop(head);
        for handle in handles {
            let _ = handle.join();
        }

        let mut cell = error.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(err) = cell.take() {
            return Err(Error::Runtime(err));
        }

        copied.map_err(|err| Error::Runtime(FilterError::Io(err)))
    }
}

fn set_first_error(cell: &Mutex<Option<FilterError>>, err: FilterError) {
    let mut guard = cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.is_none() {
        *guard = Some(err);
    }
}

fn is_broken_pipe(err: &FilterError) -> bool {
    match err {
        FilterError::Io(err) => err.kind() == io::ErrorKind::BrokenPipe,
        FilterError::Csv(err) => {
            matches!(err.kind(), csv::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::BrokenPipe)
        }
        FilterError::Invalid(_) => false,
    }
}
