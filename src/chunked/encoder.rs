/// The zero-length chunk ending a chunked body.
///
/// This is the bare `0\r\n` line. The CRLF that closes the message comes from
/// the trailer block that follows it.
pub(crate) const LAST_CHUNK: &[u8] = b"0\r\n";

/// Append `data` to `buf` framed as a single chunk: `<hex-len>\r\n<data>\r\n`.
///
/// An empty `data` produces an empty chunk framed the same way.
pub(crate) fn encode_chunk(buf: &mut Vec<u8>, data: &[u8]) {
    let start = format!("{:X}\r\n", data.len());
    buf.reserve(start.len() + data.len() + 2);
    buf.extend_from_slice(start.as_bytes());
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}
