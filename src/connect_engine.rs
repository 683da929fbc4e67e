//! The `CONNECT` tunnel engine (C5, §4.5).
//!
//! Handles validation of the tunnel target, consults the patcher, then
//! either splices raw bytes to the real origin (`Pipe`), sniffs the first
//! handshake bytes and redirects the tunnel into the dynamic TLS server
//! (`Allow` + TLS prefix), or silently drops the socket in every other
//! case. The core never synthesises an HTTP error body for the client.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use rama_http_types::Version;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::patcher::{ConnectArgs, Decision, Patcher, ReqId};
use crate::tls_server::TlsServer;
use crate::wire::RequestHead;

/// How many times to poll for the first TLS-sniff bytes before giving up on
/// a client that wrote `CONNECT` and then sent nothing.
const PEEK_ATTEMPTS: usize = 64;

pub struct ConnectEngine {
    tls_server: Arc<TlsServer>,
    tls_addr: SocketAddr,
    patcher: Arc<Patcher>,
}

impl ConnectEngine {
    #[must_use]
    pub fn new(tls_server: Arc<TlsServer>, tls_addr: SocketAddr, patcher: Arc<Patcher>) -> Self {
        Self {
            tls_server,
            tls_addr,
            patcher,
        }
    }

    /// Drive one `CONNECT host:port` transaction to completion. `stream` is
    /// the already-accepted client socket, positioned immediately after the
    /// request head (§4.5's state machine starts at `Parsed`).
    pub async fn handle(&self, mut stream: TcpStream, head: &RequestHead, req_id: ReqId) {
        let Some((host, port)) = parse_target(&head.target) else {
            // MalformedClientRequest: silently drop (§7).
            return;
        };

        let decision = self
            .patcher
            .on_connect(ConnectArgs {
                dest_host_port: format!("{host}:{port}"),
                req_id,
            })
            .await;

        match decision {
            Decision::Deny => {}
            Decision::Pipe => self.pipe(&mut stream, &host, port).await,
            Decision::Allow => self.allow(&mut stream, head, &host, port).await,
            other => crate::fatal::fatal(
                "onConnect returned a decision not valid for CONNECT",
                format!("{other:?}"),
            ),
        }
    }

    async fn pipe(&self, stream: &mut TcpStream, host: &str, port: u16) {
        match TcpStream::connect((host, port)).await {
            Ok(mut origin) => {
                if let Err(err) = tokio::io::copy_bidirectional(stream, &mut origin).await {
                    tracing::debug!(%host, port, error = %err, "Pipe tunnel ended");
                }
            }
            Err(err) => {
                tracing::warn!(%host, port, error = %err, "failed to dial Pipe target");
            }
        }
    }

    async fn allow(&self, stream: &mut TcpStream, head: &RequestHead, host: &str, port: u16) {
        if let Err(err) = write_connect_established(stream, head).await {
            tracing::warn!(%host, error = %err, "failed to write CONNECT success response");
            return;
        }

        let prefix = match peek_prefix(stream, 3).await {
            Ok(prefix) => prefix,
            Err(err) => {
                tracing::debug!(%host, error = %err, "client closed before handshake bytes arrived");
                return;
            }
        };

        if !looks_like_tls(&prefix) {
            // §4.5: anything other than a TLS 1.0-1.3 record prefix closes
            // the tunnel; plain HTTP and WebSocket over CONNECT are
            // rejected by design.
            return;
        }

        if let Err(err) = self.tls_server.prepare(host).await {
            tracing::error!(%host, error = %err, "failed to prepare SNI context for intercepted host");
            return;
        }

        match TcpStream::connect(self.tls_addr).await {
            Ok(mut local) => {
                if let Err(err) = tokio::io::copy_bidirectional(stream, &mut local).await {
                    tracing::debug!(%host, error = %err, "TLS-intercepted tunnel ended");
                }
            }
            Err(err) => {
                tracing::warn!(%host, error = %err, "failed to dial dynamic TLS server");
            }
        }
    }
}

/// §4.5 validation: `host` must contain a `.` (or equal `localhost`) and not
/// contain `*`; exactly one `:` separator; an out-of-range or malformed
/// port defaults to 443 rather than rejecting the tunnel.
fn parse_target(target: &str) -> Option<(String, u16)> {
    let mut parts = target.split(':');
    let host = parts.next()?;
    let port_str = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if host.is_empty() || host.contains('*') || !(host.contains('.') || host.eq_ignore_ascii_case("localhost")) {
        return None;
    }
    let port = port_str.parse::<u16>().unwrap_or(443);
    Some((host.to_owned(), port))
}

/// §4.5 / §6: `HTTP/<ver> 200 Connection Established`, echoing the
/// keep-alive headers the client asked for, CRLF-terminated throughout.
async fn write_connect_established(stream: &mut TcpStream, head: &RequestHead) -> io::Result<()> {
    let version_str = match head.version {
        Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    };
    let wants_keep_alive = |name: http::header::HeaderName| {
        head.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"))
    };

    let mut out = format!("{version_str} 200 Connection Established\r\n");
    if wants_keep_alive(http::header::CONNECTION) {
        out.push_str("Connection: keep-alive\r\n");
    }
    if wants_keep_alive(http::header::HeaderName::from_static("proxy-connection")) {
        out.push_str("Proxy-Connection: keep-alive\r\n");
    }
    out.push_str("\r\n");
    stream.write_all(out.as_bytes()).await?;
    stream.flush().await
}

/// Peek (without consuming) the first `len` bytes of `stream`, polling until
/// they arrive or the client gives up.
async fn peek_prefix(stream: &TcpStream, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    for _ in 0..PEEK_ATTEMPTS {
        stream.readable().await?;
        let n = stream.peek(&mut buf).await?;
        if n >= len {
            return Ok(buf);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "client never sent enough bytes to classify the tunnel",
    ))
}

/// §4.5 / §8 property 7: TLS 1.0-1.3 record prefix.
fn looks_like_tls(prefix: &[u8]) -> bool {
    prefix.len() >= 3 && prefix[0] == 0x16 && prefix[1] == 0x03 && prefix[2] <= 0x05
}
