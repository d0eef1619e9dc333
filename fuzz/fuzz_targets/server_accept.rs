#![no_main]
use libfuzzer_sys::fuzz_target;

use futures_lite::future::{self, FutureExt};
use futures_lite::io::{AsyncWrite, Cursor};
use h1_framer::server::{self, default_headers, BoxFuture, Handler, ServerOptions};
use h1_framer::{Request, ResponseWriter, Result, StatusCode};

struct Echo;

impl<W: AsyncWrite + Unpin + Send + 'static> Handler<W> for Echo {
    fn call<'a>(&'a self, req: Request, res: &'a mut ResponseWriter<W>) -> BoxFuture<'a, Result<()>> {
        async move {
            res.write_status_line(StatusCode::OK).await?;
            res.write_headers(&default_headers(req.body().len())).await?;
            res.write_body(req.body()).await?;
            Ok(())
        }
        .boxed()
    }
}

fuzz_target!(|request: &[u8]| {
    let stream = Cursor::new(request.to_vec());
    future::block_on(server::accept(stream, &Echo, &ServerOptions::default())).ok();

    // Splitting the input in two must not change what the parser accepts.
    let mut whole = Request::new();
    let whole_consumed = whole.feed(request);
    if let Ok(consumed) = whole_consumed {
        let split = request.len() / 2;
        let mut halves = Request::new();
        let first = halves.feed(&request[..split]).unwrap();
        if !halves.is_done() {
            let _ = halves.feed(&request[first..]);
        }
        if whole.is_done() && consumed == request.len() {
            assert_eq!(whole.headers(), halves.headers());
        }
    }
});
