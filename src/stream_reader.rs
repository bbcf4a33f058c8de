use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Consumer side of the channel reader: an ordered stream of characters.
///
/// Dropping it stops the reader task, which releases the read half of the
/// channel.
pub struct StreamReader {
    rx: UnboundedReceiver<char>,
    task: JoinHandle<()>,
    closed: bool,
}

impl StreamReader {
    /// Wait for the next character, giving up at `deadline`.
    ///
    /// Returns `None` once the deadline passes. After the channel has closed
    /// there is nothing left to wait for, so this sleeps until the deadline
    /// (or forever, without one).
    pub async fn next_char_before(&mut self, deadline: Option<Instant>) -> Option<char> {
        if !self.closed {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, self.rx.recv()).await.ok()?,
                None => self.rx.recv().await,
            };
            if next.is_some() {
                return next;
            }
            self.closed = true;
        }
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
        None
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a background task that drains `reader` into a character stream.
///
/// Bytes are decoded as UTF-8 across read boundaries; invalid sequences become
/// U+FFFD.
pub fn spawn_reader<R: AsyncRead + Send + Unpin + 'static>(mut reader: R) -> StreamReader {
    let (tx, rx) = unbounded_channel();

    let task = tokio::spawn(async move {
        let mut buffer = [0u8; 4096];
        let mut decoder = Utf8Decoder::default();
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) => {
                    debug!("Channel closed");
                    break;
                }
                Ok(n) => {
                    for ch in decoder.feed(&buffer[..n]) {
                        if tx.send(ch).is_err() {
                            return; // Receiver dropped
                        }
                    }
                }
                Err(e) => {
                    warn!("Read error: {e}");
                    break;
                }
            }
        }
    });

    StreamReader {
        rx,
        task,
        closed: false,
    }
}

/// Incremental UTF-8 decoder that holds back an incomplete trailing sequence.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<char> {
        self.pending.extend_from_slice(bytes);
        let mut out = Vec::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.extend(valid.chars());
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.extend(String::from_utf8_lossy(valid).chars());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = rest.to_vec();
        out
    }
}
