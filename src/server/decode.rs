//! Decode HTTP requests on the server.

use std::fmt;
use std::str::FromStr;

use futures_lite::io::{AsyncRead, AsyncReadExt};
use log::{debug, trace};

use crate::headers::{find_crlf, HeaderMap, Parsed};
use crate::{Error, Result};

const CRLF_LEN: usize = 2;

/// The only version accepted in a request line, without its `HTTP/` prefix.
const HTTP_1_1_VERSION: &str = "1.1";

const CONTENT_LENGTH: &str = "Content-Length";

/// Progress of a request through the parser.
///
/// States only ever advance in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParserState {
    /// Waiting for the request line.
    Initialized,
    /// Reading header lines, one per step.
    ParsingHeaders,
    /// Accumulating the body.
    ParsingBody,
    /// The request is complete.
    Done,
}

/// The first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// The method, an uppercase token such as `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target, kept as sent.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The version without its `HTTP/` prefix. Always `1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl FromStr for RequestLine {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split(' ').collect();
        let (method, target, version) = match parts.as_slice() {
            [method, target, version] => (*method, *target, *version),
            _ => return Err(Error::MalformedRequestLine(line.to_owned())),
        };

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::MalformedRequestLine(line.to_owned()));
        }

        let version = version.strip_prefix("HTTP/").unwrap_or(version);
        if version != HTTP_1_1_VERSION {
            return Err(Error::UnsupportedVersion(version.to_owned()));
        }

        Ok(Self {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
        })
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} HTTP/{}", self.method, self.target, self.version)
    }
}

/// A request under construction, fed bytes until it is [`ParserState::Done`].
#[derive(Debug, Clone)]
pub struct Request {
    request_line: Option<RequestLine>,
    headers: HeaderMap,
    body: Vec<u8>,
    state: ParserState,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Create an empty request waiting for its request line.
    pub fn new() -> Self {
        Self {
            request_line: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            state: ParserState::Initialized,
        }
    }

    /// The parsed request line, once the parser got past it.
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    /// The method, or `""` before the request line was parsed.
    pub fn method(&self) -> &str {
        self.request_line.as_ref().map_or("", |line| line.method())
    }

    /// The request target, or `""` before the request line was parsed.
    pub fn target(&self) -> &str {
        self.request_line.as_ref().map_or("", |line| line.target())
    }

    /// The headers parsed so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body bytes accumulated so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Whether the request is complete.
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// The declared `Content-Length`, if any.
    pub fn content_length(&self) -> Result<Option<usize>> {
        match self.headers.get(CONTENT_LENGTH) {
            None => Ok(None),
            Some(value) => value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(value.to_owned())),
        }
    }

    /// Feed buffered bytes to the parser, returning how many were consumed.
    ///
    /// The caller keeps the unconsumed remainder and passes it again, followed
    /// by newly read bytes, on the next call. `Ok(0)` means more input is
    /// needed; any error means the input is rejected.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize> {
        if self.is_done() {
            return Err(Error::ParserAlreadyDone);
        }

        let mut consumed = 0;
        while !self.is_done() {
            let n = self.parse_single(&data[consumed..])?;
            consumed += n;
            if n == 0 {
                break;
            }
        }
        trace!("fed {} bytes, consumed {}, state {:?}", data.len(), consumed, self.state);
        Ok(consumed)
    }

    /// Signal that the stream ended.
    ///
    /// Succeeds when the request is complete, or when the headers are complete
    /// and no `Content-Length` bounds the body.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            ParserState::Done => Ok(()),
            ParserState::ParsingBody if self.content_length()?.is_none() => {
                self.advance(ParserState::Done);
                Ok(())
            }
            state => Err(Error::IncompleteRequest { state }),
        }
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            ParserState::Initialized => {
                let idx = match find_crlf(data) {
                    Some(idx) => idx,
                    None => return Ok(0),
                };
                let line = std::str::from_utf8(&data[..idx]).map_err(|_| {
                    Error::MalformedRequestLine(String::from_utf8_lossy(&data[..idx]).into())
                })?;
                let request_line = line.parse::<RequestLine>()?;
                debug!("request line: {}", request_line);
                self.request_line = Some(request_line);
                self.advance(ParserState::ParsingHeaders);
                Ok(idx + CRLF_LEN)
            }
            ParserState::ParsingHeaders => match self.headers.parse(data)? {
                Parsed::Partial => Ok(0),
                Parsed::Field(n) => Ok(n),
                Parsed::End(n) => {
                    self.advance(ParserState::ParsingBody);
                    Ok(n)
                }
            },
            ParserState::ParsingBody => {
                let declared = match self.content_length()? {
                    Some(len) => len,
                    None => {
                        self.body.extend_from_slice(data);
                        self.advance(ParserState::Done);
                        return Ok(data.len());
                    }
                };
                let received = self.body.len() + data.len();
                if received > declared {
                    return Err(Error::BodyLengthMismatch { declared, received });
                }
                self.body.extend_from_slice(data);
                if received == declared {
                    self.advance(ParserState::Done);
                }
                Ok(data.len())
            }
            ParserState::Done => Err(Error::ParserAlreadyDone),
        }
    }

    fn advance(&mut self, next: ParserState) {
        debug_assert!(next > self.state, "parser state must only advance");
        trace!("parser state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Configure the read buffer used by [`decode_with_opts`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Initial buffer size in bytes. Defaults to 1 KiB.
    pub initial_capacity: usize,
    /// Size the buffer may never grow past. Defaults to 64 KiB.
    pub max_capacity: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_capacity: 64 * 1024,
        }
    }
}

/// Decode an HTTP request on the server.
///
/// Returns `Ok(None)` when the stream ends before yielding a single byte.
pub async fn decode<R>(reader: R) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    decode_with_opts(reader, &DecodeOptions::default()).await
}

/// Decode an HTTP request on the server with custom buffer options.
pub async fn decode_with_opts<R>(mut reader: R, opts: &DecodeOptions) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; opts.initial_capacity.max(1)];
    let mut filled = 0;
    let mut total_read = 0;
    let mut req = Request::new();

    while !req.is_done() {
        // A full buffer means the pending line is longer than the buffer.
        if filled == buf.len() {
            let grown = buf.len() * 2;
            if grown > opts.max_capacity {
                return Err(Error::BufferLimitExceeded {
                    limit: opts.max_capacity,
                });
            }
            trace!("growing read buffer to {} bytes", grown);
            buf.resize(grown, 0);
        }

        let bytes_read = reader.read(&mut buf[filled..]).await?;
        if bytes_read == 0 {
            if total_read == 0 {
                return Ok(None);
            }
            req.finish()?;
            break;
        }
        total_read += bytes_read;
        filled += bytes_read;

        let consumed = req.feed(&buf[..filled])?;
        buf.copy_within(consumed..filled, 0);
        filled -= consumed;
    }

    debug!(
        "decoded {} with {} headers and {} body bytes",
        req.request_line().map_or_else(String::new, |line| line.to_string()),
        req.headers().len(),
        req.body().len()
    );
    Ok(Some(req))
}
