use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_lite::io::{AsyncRead, AsyncWrite};

/// Convert the `\n` line endings of a fixture to `\r\n`.
#[allow(dead_code)]
pub fn crlf(s: &str) -> String {
    s.replace('\n', "\r\n")
}

/// A reader that yields its pieces one per `read` call, then end of stream.
#[derive(Debug, Default)]
pub struct ChunkedReader {
    pieces: VecDeque<Vec<u8>>,
}

#[allow(dead_code)]
impl ChunkedReader {
    pub fn new<I, P>(pieces: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self {
            pieces: pieces.into_iter().map(|p| p.as_ref().to_vec()).collect(),
        }
    }

    /// Split `data` into pieces of at most `size` bytes.
    pub fn every(data: &[u8], size: usize) -> Self {
        Self::new(data.chunks(size))
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let piece = match self.pieces.pop_front() {
            Some(piece) => piece,
            None => return Poll::Ready(Ok(0)),
        };
        let len = std::cmp::min(piece.len(), buf.len());
        buf[..len].copy_from_slice(&piece[..len]);
        if len < piece.len() {
            self.pieces.push_front(piece[len..].to_vec());
        }
        Poll::Ready(Ok(len))
    }
}

/// A connection reading from a [`ChunkedReader`] and recording what is written.
///
/// The recorded output stays reachable after the connection is consumed.
#[derive(Debug)]
pub struct TestIO {
    read: ChunkedReader,
    pub written: Arc<Mutex<Vec<u8>>>,
    pub closed: Arc<Mutex<bool>>,
}

#[allow(dead_code)]
impl TestIO {
    pub fn new(read: ChunkedReader) -> Self {
        Self {
            read,
            written: Arc::default(),
            closed: Arc::default(),
        }
    }
}

impl AsyncRead for TestIO {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.read).poll_read(cx, buf)
    }
}

impl AsyncWrite for TestIO {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        *self.closed.lock().unwrap() = true;
        Poll::Ready(Ok(()))
    }
}
