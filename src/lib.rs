//! Incremental HTTP 1.1 request framer and response writer.
//!
//! A server reads bytes off a stream, hands them to a [`Request`] until the
//! request is complete, passes the request to a handler, and writes the
//! response back through a [`ResponseWriter`].
//!
//! ```txt
//!   bytes -> Request::feed -> Request -> handler -> ResponseWriter -> bytes
//! ```
//!
//! The parser never blocks: [`Request::feed`] consumes what it can from a
//! buffer and reports how many bytes it used. `Ok(0)` means more input is
//! needed, an error means the input is rejected. [`server::decode`] drives the
//! parser over any [`AsyncRead`](futures_lite::io::AsyncRead), growing its
//! buffer as needed.
//!
//! The writer serializes the status line, headers and either a fixed body or a
//! chunked body with trailers, in that order.
//!
//! Header names are case-sensitive and connections are never kept alive.
//!
//! # Example
//!
//! ```
//! use futures_lite::future;
//! use h1_framer::{HeaderMap, Request, ResponseWriter, StatusCode};
//!
//! # fn main() -> h1_framer::Result<()> {
//! let mut req = Request::new();
//! let consumed = req.feed(b"GET /coffee HTTP/1.1\r\nHost: localhost\r\n\r\n")?;
//! assert_eq!(consumed, 41);
//! assert!(req.is_done());
//! assert_eq!(req.target(), "/coffee");
//!
//! let mut res = ResponseWriter::new(Vec::new());
//! future::block_on(async {
//!     let mut headers = HeaderMap::new();
//!     headers.insert("Content-Length", "5");
//!     res.write_status_line(StatusCode::OK).await?;
//!     res.write_headers(&headers).await?;
//!     res.write_body(b"hello").await
//! })?;
//! assert_eq!(res.into_inner(), b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code, future_incompatible, rust_2018_idioms)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

pub use error::{Error, MissingTrailer};
pub use headers::HeaderMap;
pub use server::{ParserState, Request, RequestLine, ResponseWriter, StatusCode};

mod chunked;
mod error;

pub mod headers;
pub mod server;

/// A specialized `Result` for framing operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
