use futures_lite::io::AsyncWrite;
use futures_lite::FutureExt;
use h1_framer::server::{default_headers, BoxFuture, Handler};
use h1_framer::{HeaderMap, Request, ResponseWriter, Result, StatusCode};
use log::{debug, warn};
use sha2::{Digest, Sha256};

/// Upper bound on the lines served by `/stream/<n>`.
const MAX_STREAM_LINES: usize = 100;

/// Routes a request target to a canned response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Demo;

impl<W> Handler<W> for Demo
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn call<'a>(&'a self, req: Request, res: &'a mut ResponseWriter<W>) -> BoxFuture<'a, Result<()>> {
        async move {
            let target = req.target();
            if let Some(count) = target.strip_prefix("/stream/") {
                return stream(count, res).await;
            }
            match target {
                "/yourproblem" => {
                    html(
                        res,
                        StatusCode::BAD_REQUEST,
                        "Bad Request",
                        "Your request honestly kinda sucked.",
                    )
                    .await
                }
                "/myproblem" => {
                    html(
                        res,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error",
                        "Okay, you know what? This one is on me.",
                    )
                    .await
                }
                _ => html(res, StatusCode::OK, "Success!", "Your request was an absolute banger.").await,
            }
        }
        .boxed()
    }
}

async fn html<W>(res: &mut ResponseWriter<W>, status: StatusCode, title: &str, message: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let reason = status.canonical_reason().unwrap_or("");
    let body = format!(
        "<html>\n<head>\n<title>{} {}</title>\n</head>\n<body>\n<h1>{}</h1>\n<p>{}</p>\n</body>\n</html>\n",
        status, reason, title, message
    );

    let mut headers = default_headers(body.len());
    headers.insert("Content-Type", "text/html");

    res.write_status_line(status).await?;
    res.write_headers(&headers).await?;
    res.write_body(body.as_bytes()).await?;
    Ok(())
}

/// Stream `count` generated lines as a chunked body with checksum trailers.
async fn stream<W>(count: &str, res: &mut ResponseWriter<W>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let count = match count.parse::<usize>() {
        Ok(count) => count.min(MAX_STREAM_LINES),
        Err(_) => {
            return html(
                res,
                StatusCode::BAD_REQUEST,
                "Bad Request",
                "The stream length must be a number.",
            )
            .await
        }
    };

    let mut headers = default_headers(0);
    headers.insert("Content-Type", "application/json");
    headers.insert("Transfer-Encoding", "chunked");
    headers.insert("Trailer", "X-Content-SHA256, X-Content-Length");

    res.write_status_line(StatusCode::OK).await?;
    res.write_headers(&headers).await?;

    let mut hasher = Sha256::new();
    let mut len = 0;
    for id in 0..count {
        let line = format!("{{\"id\": {}, \"url\": \"/stream/{}\"}}\n", id, count);
        res.write_chunked_body(line.as_bytes()).await?;
        hasher.update(line.as_bytes());
        len += line.len();
    }
    res.write_chunked_body_done().await?;
    debug!("streamed {} lines, {} bytes", count, len);

    let mut trailers = HeaderMap::new();
    trailers.insert("X-Content-SHA256", format!("{:x}", hasher.finalize()));
    trailers.insert("X-Content-Length", len.to_string());
    for missing in res.write_trailers(&trailers).await? {
        warn!("{}", missing);
    }
    Ok(())
}
