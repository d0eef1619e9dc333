//! Encode HTTP responses on the server.

use std::fmt;

use futures_lite::io::{AsyncWrite, AsyncWriteExt};
use log::{trace, warn};

use crate::chunked::{encode_chunk, trailer_names, LAST_CHUNK};
use crate::error::MissingTrailer;
use crate::headers::HeaderMap;
use crate::{Error, Result};

const TRAILER: &str = "Trailer";

/// An HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// The reason phrase written after the code, for the codes that have one.
    pub fn canonical_reason(self) -> Option<&'static str> {
        match self {
            StatusCode::OK => Some("OK"),
            StatusCode::BAD_REQUEST => Some("Bad Request"),
            StatusCode::INTERNAL_SERVER_ERROR => Some("Internal Server Error"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

/// The next step a [`ResponseWriter`] expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing was written yet.
    StatusLine,
    /// The status line was written.
    Headers,
    /// The head was written; a fixed or chunked body may follow.
    Body,
    /// At least one chunk was written.
    Chunked,
    /// The last chunk was written; trailers may follow.
    Trailers,
    /// The response is complete.
    Done,
}

/// Headers for a plain-text response that closes the connection.
///
/// `Content-Length` is only set for a non-empty body.
pub fn default_headers(content_len: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if content_len > 0 {
        headers.insert("Content-Length", content_len.to_string());
    }
    headers.insert("Connection", "close");
    headers.insert("Content-Type", "text/plain");
    headers
}

/// Writes a response to a stream in protocol order.
///
/// The steps are: [`write_status_line`], [`write_headers`], then either one
/// [`write_body`] or any number of [`write_chunked_body`] followed by
/// [`write_chunked_body_done`] and optionally [`write_trailers`]. A step called
/// out of order fails without writing anything.
///
/// [`write_status_line`]: ResponseWriter::write_status_line
/// [`write_headers`]: ResponseWriter::write_headers
/// [`write_body`]: ResponseWriter::write_body
/// [`write_chunked_body`]: ResponseWriter::write_chunked_body
/// [`write_chunked_body_done`]: ResponseWriter::write_chunked_body_done
/// [`write_trailers`]: ResponseWriter::write_trailers
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    state: WriterState,
    /// Value of the `Trailer` header, if the head declared one.
    trailer: Option<String>,
    /// Value of the `Content-Length` header, if the head declared one.
    content_length: Option<String>,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    /// Create a new instance.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: WriterState::StatusLine,
            trailer: None,
            content_length: None,
        }
    }

    /// The next step this writer expects.
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write `HTTP/1.1 <code> <reason>\r\n`.
    ///
    /// Codes without a known reason phrase leave the reason empty.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<()> {
        self.check_step("write the status line", &[WriterState::StatusLine])?;

        let reason = status.canonical_reason().unwrap_or("");
        let line = format!("HTTP/1.1 {} {}\r\n", status, reason);
        trace!("> {}", line.trim_end());
        self.writer.write_all(line.as_bytes()).await?;

        self.state = WriterState::Headers;
        Ok(())
    }

    /// Write one `Name: Value` line per header, then a blank line.
    ///
    /// A `Trailer` header is remembered for [`write_trailers`](Self::write_trailers).
    pub async fn write_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.check_step("write headers", &[WriterState::Headers])?;

        let buf = encode_fields(headers);
        self.writer.write_all(&buf).await?;

        self.trailer = headers.get(TRAILER).map(str::to_owned);
        self.content_length = headers.get("Content-Length").map(str::to_owned);
        self.state = WriterState::Body;
        Ok(())
    }

    /// Write a whole body, sized by a previously written `Content-Length`.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize> {
        self.check_step("write a body", &[WriterState::Body])?;

        let declared = self.content_length.as_deref().and_then(|len| len.parse::<usize>().ok());
        if declared.map_or(!body.is_empty(), |len| len != body.len()) {
            warn!(
                "body of {} bytes does not match declared content-length {:?}",
                body.len(),
                self.content_length
            );
        }

        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        trace!("> {} body bytes", body.len());

        self.state = WriterState::Done;
        Ok(body.len())
    }

    /// Write `data` as one chunk, returning the number of bytes written including framing.
    ///
    /// An empty `data` writes an empty chunk, which does not end the body.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize> {
        self.check_step("write a chunk", &[WriterState::Body, WriterState::Chunked])?;

        let mut buf = Vec::new();
        encode_chunk(&mut buf, data);
        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;
        trace!("> chunk of {} bytes", data.len());

        self.state = WriterState::Chunked;
        Ok(buf.len())
    }

    /// Write the last chunk, `0\r\n`.
    pub async fn write_chunked_body_done(&mut self) -> Result<usize> {
        self.check_step("end a chunked body", &[WriterState::Body, WriterState::Chunked])?;

        self.writer.write_all(LAST_CHUNK).await?;
        trace!("> last chunk");

        self.state = WriterState::Trailers;
        Ok(LAST_CHUNK.len())
    }

    /// Write the trailers declared by the `Trailer` header, then a blank line.
    ///
    /// Only declared names present in `headers` are written. Each declared name
    /// missing from `headers` is returned, after every found trailer was written.
    pub async fn write_trailers(&mut self, headers: &HeaderMap) -> Result<Vec<MissingTrailer>> {
        self.check_step("write trailers", &[WriterState::Trailers])?;

        let mut trailers = HeaderMap::new();
        let mut missing = Vec::new();
        if let Some(declared) = self.trailer.as_deref() {
            for name in trailer_names(declared) {
                match headers.get(name) {
                    Some(value) => trailers.insert(name, value),
                    None => missing.push(MissingTrailer(name.to_owned())),
                }
            }
        }

        let buf = encode_fields(&trailers);
        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;

        for trailer in &missing {
            warn!("{}", trailer);
        }
        self.state = WriterState::Done;
        Ok(missing)
    }

    fn check_step(&self, step: &'static str, allowed: &[WriterState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidWriteOrder {
                step,
                state: self.state,
            })
        }
    }
}

/// Serialize header fields followed by the blank line ending the block.
fn encode_fields(headers: &HeaderMap) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in headers.iter() {
        trace!("> {}: {}", name, value);
        buf.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons() {
        assert_eq!(StatusCode::OK.canonical_reason(), Some("OK"));
        assert_eq!(StatusCode(400).canonical_reason(), Some("Bad Request"));
        assert_eq!(
            StatusCode::from(500).canonical_reason(),
            Some("Internal Server Error")
        );
        assert_eq!(StatusCode(404).canonical_reason(), None);
    }

    #[test]
    fn default_headers_skip_empty_length() {
        let headers = default_headers(0);
        assert_eq!(headers.get("Content-Length"), None);
        assert_eq!(headers.get("Connection"), Some("close"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));

        let headers = default_headers(13);
        assert_eq!(headers.get("Content-Length"), Some("13"));
    }

    #[test]
    fn fields_end_with_blank_line() {
        let headers: HeaderMap = vec![("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(encode_fields(&headers), b"A: 1\r\nB: 2\r\n\r\n");
        assert_eq!(encode_fields(&HeaderMap::new()), b"\r\n");
    }
}
