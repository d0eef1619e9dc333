use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::server::{ParserState, StatusCode, WriterState};

/// Errors when decoding requests or encoding responses.
#[derive(Debug)]
pub enum Error {
    /// The request line is not `METHOD SP TARGET SP VERSION`, or the method is
    /// not an uppercase token.
    MalformedRequestLine(String),
    /// The request line names a version other than `HTTP/1.1`.
    UnsupportedVersion(String),
    /// A header line has no colon.
    MalformedHeaderField(String),
    /// A header name has whitespace before its colon.
    MalformedHeaderKey(String),
    /// The `Content-Length` header is not a non-negative integer.
    InvalidContentLength(String),
    /// More body bytes arrived than `Content-Length` declared.
    BodyLengthMismatch {
        /// The declared `Content-Length`.
        declared: usize,
        /// The body length the request would have reached.
        received: usize,
    },
    /// The stream ended before the request was complete.
    IncompleteRequest {
        /// The parser state when the stream ended.
        state: ParserState,
    },
    /// The parser already produced a complete request.
    ParserAlreadyDone,
    /// The read buffer would have to grow past its configured limit.
    BufferLimitExceeded {
        /// The configured limit in bytes.
        limit: usize,
    },
    /// A response writer step was invoked out of protocol order.
    InvalidWriteOrder {
        /// The step that was attempted.
        step: &'static str,
        /// The state the writer was in.
        state: WriterState,
    },
    /// An I/O error from the underlying stream.
    Io(io::Error),
}

impl Error {
    /// Whether the error rejects the peer's input, as opposed to an internal failure.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, Error::InvalidWriteOrder { .. } | Error::Io(_))
    }

    /// The status code of the best-effort response sent for this error.
    pub fn status(&self) -> StatusCode {
        if self.is_parse_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedRequestLine(line) => write!(f, "malformed request line: {:?}", line),
            Error::UnsupportedVersion(version) => {
                write!(f, "unsupported HTTP version {:?}, only 1.1 is supported", version)
            }
            Error::MalformedHeaderField(line) => write!(f, "malformed header field: {:?}", line),
            Error::MalformedHeaderKey(key) => write!(f, "malformed header key: {:?}", key),
            Error::InvalidContentLength(value) => write!(f, "invalid content-length: {:?}", value),
            Error::BodyLengthMismatch { declared, received } => write!(
                f,
                "body length {} exceeds declared content-length {}",
                received, declared
            ),
            Error::IncompleteRequest { state } => {
                write!(f, "stream ended with an incomplete request in state {:?}", state)
            }
            Error::ParserAlreadyDone => write!(f, "parser already produced a complete request"),
            Error::BufferLimitExceeded { limit } => {
                write!(f, "request line or header exceeds {} bytes", limit)
            }
            Error::InvalidWriteOrder { step, state } => {
                write!(f, "cannot {} while the writer is in state {:?}", step, state)
            }
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// A trailer named by the `Trailer` header but absent from the supplied headers.
///
/// Missing trailers never abort writing the trailers that were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTrailer(pub String);

impl fmt::Display for MissingTrailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trailer {} not found in headers", self.0)
    }
}

impl StdError for MissingTrailer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_for_errors() {
        let err = Error::MalformedHeaderKey("Host ".into());
        assert!(err.is_parse_error());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = Error::BufferLimitExceeded { limit: 8 };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(!err.is_parse_error());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.source().is_some());
    }
}
