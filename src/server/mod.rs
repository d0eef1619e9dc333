//! Process HTTP connections on the server.

use std::future::Future;
use std::net::{TcpListener, TcpStream};
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use async_io::Async;
use futures_lite::future::FutureExt;
use futures_lite::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use log::{debug, error, trace, warn};

use crate::{Error, Result};

mod cancel;
mod decode;
mod encode;

pub use cancel::CancellationToken;
pub use decode::{decode, decode_with_opts, DecodeOptions, ParserState, Request, RequestLine};
pub use encode::{default_headers, ResponseWriter, StatusCode, WriterState};

/// An owned future that may borrow for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handles a decoded request by driving a [`ResponseWriter`].
///
/// The response is complete once the handler returns. Implemented for every
/// `Fn(Request, &mut ResponseWriter<W>) -> BoxFuture<'_, Result<()>>`.
pub trait Handler<W>: Send + Sync + 'static {
    /// Write the response to `req`.
    fn call<'a>(&'a self, req: Request, res: &'a mut ResponseWriter<W>) -> BoxFuture<'a, Result<()>>;
}

impl<W, F> Handler<W> for F
where
    F: for<'a> Fn(Request, &'a mut ResponseWriter<W>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, req: Request, res: &'a mut ResponseWriter<W>) -> BoxFuture<'a, Result<()>> {
        (self)(req, res)
    }
}

/// Configure the server.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Read buffer limits used while decoding requests.
    pub decode: DecodeOptions,
}

/// Accept a new incoming HTTP/1.1 connection.
///
/// Decodes one request, passes it to `handler` and closes the stream. Every
/// connection is treated as non-persistent. A request that fails to decode is
/// answered with a best-effort error response.
pub async fn accept<RW, H>(mut io: RW, handler: &H, opts: &ServerOptions) -> Result<()>
where
    RW: AsyncRead + AsyncWrite + Unpin,
    H: Handler<RW> + ?Sized,
{
    let decoded = decode_with_opts(&mut io, &opts.decode).await;
    let mut res = ResponseWriter::new(io);

    let outcome = match decoded {
        Ok(Some(req)) => {
            debug!("{} {}", req.method(), req.target());
            let handled = handler.call(req, &mut res).await;
            match handled {
                Ok(()) => Ok(()),
                Err(err) if res.state() == WriterState::StatusLine => {
                    error!("handler failed before responding: {}", err);
                    write_error(&mut res, StatusCode::INTERNAL_SERVER_ERROR, &err).await;
                    Err(err)
                }
                Err(err) => {
                    error!("handler failed mid-response in state {:?}: {}", res.state(), err);
                    Err(err)
                }
            }
        }
        // The peer closed the stream without sending anything.
        Ok(None) => Ok(()),
        Err(err) => {
            warn!("rejecting request: {}", err);
            write_error(&mut res, err.status(), &err).await;
            Err(err)
        }
    };

    let mut io = res.into_inner();
    if let Err(err) = io.close().await {
        trace!("closing connection failed: {}", err);
    }
    outcome
}

/// Write a plain-text error response, ignoring failures.
async fn write_error<W>(res: &mut ResponseWriter<W>, status: StatusCode, err: &Error)
where
    W: AsyncWrite + Unpin,
{
    let body = format!("{}\n", err);
    let headers = default_headers(body.len());
    let written = async {
        res.write_status_line(status).await?;
        res.write_headers(&headers).await?;
        res.write_body(body.as_bytes()).await
    };
    if let Err(err) = written.await {
        debug!("failed to write error response: {}", err);
    }
}

/// Accept connections from `listener` until `token` is cancelled.
///
/// Each connection is handled in its own task. A failing or panicking
/// connection is logged and never stops the loop. Once cancelled, no new
/// connection is accepted and the call returns after every in-flight
/// connection finished.
pub async fn listen<H>(
    listener: Async<TcpListener>,
    handler: H,
    opts: ServerOptions,
    token: CancellationToken,
) where
    H: Handler<Async<TcpStream>>,
{
    let handler = Arc::new(handler);
    let opts = Arc::new(opts);
    // Every connection task holds a sender; `drained` closes once all are dropped.
    let (inflight, drained) = async_channel::bounded::<()>(1);

    while !token.is_cancelled() {
        let accepted = async { Some(listener.accept().await) }
            .or(async {
                token.cancelled().await;
                None
            })
            .await;

        let (stream, peer) = match accepted {
            Some(Ok(conn)) => conn,
            Some(Err(err)) => {
                error!("failed to establish connection: {}", err);
                continue;
            }
            None => break,
        };
        debug!("accepted connection from {}", peer);

        let handler = handler.clone();
        let opts = opts.clone();
        let guard = inflight.clone();
        async_global_executor::spawn(async move {
            let conn = accept(stream, &*handler, &opts);
            match AssertUnwindSafe(conn).catch_unwind().await {
                Ok(Ok(())) => debug!("connection from {} closed", peer),
                Ok(Err(err)) => debug!("connection from {} closed with error: {}", peer, err),
                Err(_) => error!("connection from {} panicked", peer),
            }
            drop(guard);
        })
        .detach();
    }

    debug!("accept loop stopped, waiting for in-flight connections");
    drop(inflight);
    let _ = drained.recv().await;
}
