mod common;

mod server_decode {
    use super::common::{crlf, ChunkedReader};
    use h1_framer::server::{decode, decode_with_opts, DecodeOptions};
    use h1_framer::{Error, ParserState, Request, Result};
    use pretty_assertions::assert_eq;

    const POST: &str = "POST /submit HTTP/1.1
Host: localhost:42069
User-Agent: curl/7.81.0
Content-Length: 13

hello, world!";

    async fn decode_pieces<P: AsRef<[u8]>>(pieces: Vec<P>) -> Result<Option<Request>> {
        decode_with_opts(
            ChunkedReader::new(pieces),
            &DecodeOptions {
                initial_capacity: 8,
                ..DecodeOptions::default()
            },
        )
        .await
    }

    fn assert_same(actual: &Request, expected: &Request) {
        assert_eq!(actual.request_line(), expected.request_line());
        assert_eq!(actual.headers(), expected.headers());
        assert_eq!(actual.body(), expected.body());
        assert_eq!(actual.state(), ParserState::Done);
    }

    #[async_std::test]
    async fn post_with_body() -> Result<()> {
        let request = decode(ChunkedReader::new(vec![crlf(POST)])).await?.unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.target(), "/submit");
        assert_eq!(request.request_line().unwrap().version(), "1.1");
        assert_eq!(request.headers().get("Host"), Some("localhost:42069"));
        assert_eq!(request.headers().get("User-Agent"), Some("curl/7.81.0"));
        assert_eq!(request.body(), b"hello, world!");
        Ok(())
    }

    #[async_std::test]
    async fn arbitrary_chunking_is_equivalent() -> Result<()> {
        let data = crlf(POST).into_bytes();
        let whole = decode(ChunkedReader::new(vec![&data[..]])).await?.unwrap();

        for size in 1..=data.len() {
            let request = decode_with_opts(
                ChunkedReader::every(&data, size),
                &DecodeOptions {
                    initial_capacity: 8,
                    ..DecodeOptions::default()
                },
            )
            .await?
            .unwrap();
            assert_same(&request, &whole);
        }

        for split in 1..data.len() {
            let request = decode_pieces(vec![&data[..split], &data[split..]]).await?.unwrap();
            assert_same(&request, &whole);
        }
        Ok(())
    }

    #[test]
    fn feed_split_header_value() {
        let mut split = Request::new();
        assert_eq!(split.feed(b"GET / HTTP/1.1\r\nHost: f").unwrap(), 16);
        assert_eq!(split.feed(b"Host: foo\r\n").unwrap(), 11);

        let mut whole = Request::new();
        whole.feed(b"GET / HTTP/1.1\r\nHost: foo\r\n").unwrap();

        assert_eq!(split.headers(), whole.headers());
        assert_eq!(split.headers().get("Host"), Some("foo"));
    }

    #[async_std::test]
    async fn split_header_value_over_reads() -> Result<()> {
        let request = decode_pieces(vec!["GET / HTTP/1.1\r\nHost: f", "oo\r\n", "\r\n"])
            .await?
            .unwrap();
        assert_eq!(request.headers().get("Host"), Some("foo"));
        Ok(())
    }

    #[async_std::test]
    async fn empty_stream() -> Result<()> {
        let request = decode(ChunkedReader::new(Vec::<&[u8]>::new())).await?;
        assert!(request.is_none());
        Ok(())
    }

    #[async_std::test]
    async fn short_body_is_incomplete_at_eof() {
        let data = crlf(
            "POST / HTTP/1.1
Host: example.com
Content-Length: 11

not 11",
        );
        let err = decode(ChunkedReader::new(vec![data])).await.unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteRequest {
                state: ParserState::ParsingBody
            }
        ));
    }

    #[async_std::test]
    async fn truncated_head_is_incomplete_at_eof() {
        let err = decode_pieces(vec!["GET / HTTP/1.1\r\nHost: a"]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteRequest {
                state: ParserState::ParsingHeaders
            }
        ));

        let err = decode_pieces(vec!["GET / HT"]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteRequest {
                state: ParserState::Initialized
            }
        ));
    }

    #[async_std::test]
    async fn body_longer_than_content_length() {
        let data = crlf(
            "POST / HTTP/1.1
Content-Length: 2

abc",
        );
        let err = decode(ChunkedReader::new(vec![data])).await.unwrap_err();
        assert!(matches!(
            err,
            Error::BodyLengthMismatch {
                declared: 2,
                received: 3
            }
        ));
    }

    #[async_std::test]
    async fn body_without_content_length_ends_with_head() -> Result<()> {
        let data = crlf(
            "POST / HTTP/1.1
Host: a

trailing bytes",
        );
        let request = decode(ChunkedReader::new(vec![data])).await?.unwrap();
        assert_eq!(request.body(), b"trailing bytes");
        Ok(())
    }

    #[async_std::test]
    async fn long_lines_grow_the_buffer() -> Result<()> {
        let value = "x".repeat(500);
        let data = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", value);
        let request = decode_pieces(vec![data.as_bytes()]).await?.unwrap();
        assert_eq!(request.headers().get("X-Long"), Some(value.as_str()));
        Ok(())
    }

    #[async_std::test]
    async fn buffer_limit() {
        let data = format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "x".repeat(100));
        let err = decode_with_opts(
            ChunkedReader::new(vec![data]),
            &DecodeOptions {
                initial_capacity: 16,
                max_capacity: 64,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BufferLimitExceeded { limit: 64 }));
    }

    #[async_std::test]
    async fn malformed_request_lines() {
        for line in &["get /x HTTP/1.1", "GET1 /x HTTP/1.1", "/x HTTP/1.1", "GET /x  HTTP/1.1"] {
            let data = format!("{}\r\nHost: a\r\n\r\n", line);
            let err = decode(ChunkedReader::new(vec![data])).await.unwrap_err();
            assert!(matches!(err, Error::MalformedRequestLine(_)), "{}", line);
        }
    }

    #[async_std::test]
    async fn unsupported_version() {
        let err = decode(ChunkedReader::new(vec!["GET /x HTTP/1.0\r\n\r\n"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(_)));
    }

    #[async_std::test]
    async fn malformed_headers() {
        let err = decode(ChunkedReader::new(vec!["GET / HTTP/1.1\r\nHost : a\r\n\r\n"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedHeaderKey(_)));

        let err = decode(ChunkedReader::new(vec!["GET / HTTP/1.1\r\nHost a\r\n\r\n"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedHeaderField(_)));

        let err = decode(ChunkedReader::new(vec![
            "POST / HTTP/1.1\r\nContent-Length: five\r\n\r\n",
        ]))
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidContentLength(_)));
    }
}
