//! The keep-alive outbound connection pool (C1, §4.1).
//!
//! Separate pools are kept for cleartext and TLS upstreams; within each,
//! connections are grouped by [`AgentKey`] — the keep-alive policy
//! negotiated with the previous inbound request, which in turn decides how
//! long an idle outbound socket may be reused before the agent simply dials
//! a fresh one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rama_error::{ErrorContext, OpaqueError};
use rama_http_types::{HeaderMap, Version};
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::TlsConnector;

use crate::util::keep_alive;

/// Idle sockets older than this are assumed dead rather than risk writing
/// into a half-closed connection; used when no `Keep-Alive: timeout=` was
/// negotiated.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(4);

/// A pooled outbound connection, either plaintext or behind a client-side
/// TLS handshake to the real origin, exposed uniformly to callers.
pub trait Conn: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Conn for T {}

/// Key under which outbound agents are cached (§3 `AgentKey`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AgentKey {
    Close,
    Default,
    TimeoutMs(u64),
}

impl AgentKey {
    /// Policy of §4.1: derive the key for this transaction's keep-alive
    /// negotiation.
    fn derive(http_version: Version, headers: &HeaderMap) -> Self {
        let connection = headers
            .get(http::header::CONNECTION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let wants_close = connection.eq_ignore_ascii_case("close");
        let wants_keep_alive = connection.eq_ignore_ascii_case("keep-alive");

        if wants_close || (http_version == Version::HTTP_10 && !wants_keep_alive) {
            return Self::Close;
        }
        if let Some(value) = headers
            .get(http::header::HeaderName::from_static("keep-alive"))
            .and_then(|v| v.to_str().ok())
            .and_then(keep_alive::timeout_secs)
        {
            return Self::TimeoutMs((value * 1000.0).round() as u64);
        }
        Self::Default
    }

    fn idle_timeout(self) -> Duration {
        match self {
            Self::Close => Duration::ZERO,
            Self::Default => DEFAULT_IDLE_TIMEOUT,
            Self::TimeoutMs(ms) => Duration::from_millis(ms),
        }
    }
}

struct Idle {
    stream: Box<dyn Conn>,
    parked_at: Instant,
}

/// An outbound connection manager for one keep-alive policy. `keep_alive`
/// decides whether sockets are returned to the pool at all; everything
/// else in this struct is bookkeeping for reuse.
pub struct Agent {
    key: AgentKey,
    use_tls: bool,
    tls_connector: Option<TlsConnector>,
    idle: Mutex<HashMap<(String, u16), Vec<Idle>>>,
}

impl Agent {
    fn new(key: AgentKey, use_tls: bool, tls_connector: Option<TlsConnector>) -> Self {
        Self {
            key,
            use_tls,
            tls_connector,
            idle: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn keep_alive(&self) -> bool {
        !matches!(self.key, AgentKey::Close)
    }

    /// Obtain a connection to `host:port`, reusing an idle one from this
    /// agent's pool if one is both present and not past its keep-alive
    /// window.
    pub async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Conn>, OpaqueError> {
        if let Some(stream) = self.take_idle(host, port).await {
            return Ok(stream);
        }
        self.dial(host, port).await
    }

    /// Return a connection to the pool for reuse, or drop it if this
    /// agent's policy is non-keep-alive.
    pub async fn release(&self, host: &str, port: u16, stream: Box<dyn Conn>) {
        if !self.keep_alive() {
            return;
        }
        let mut idle = self.idle.lock().await;
        idle.entry((host.to_owned(), port)).or_default().push(Idle {
            stream,
            parked_at: Instant::now(),
        });
    }

    async fn take_idle(&self, host: &str, port: u16) -> Option<Box<dyn Conn>> {
        let mut idle = self.idle.lock().await;
        let bucket = idle.get_mut(&(host.to_owned(), port))?;
        let timeout = self.key.idle_timeout();
        while let Some(candidate) = bucket.pop() {
            if candidate.parked_at.elapsed() < timeout {
                return Some(candidate.stream);
            }
        }
        None
    }

    async fn dial(&self, host: &str, port: u16) -> Result<Box<dyn Conn>, OpaqueError> {
        let tcp = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("dial {host}:{port}"))?;
        tcp.set_nodelay(true).ok();

        if !self.use_tls {
            return Ok(Box::new(tcp));
        }

        let connector = self
            .tls_connector
            .as_ref()
            .ok_or_else(|| OpaqueError::from_display("TLS agent missing a connector"))?;
        let server_name = ServerName::try_from(host.to_owned())
            .with_context(|| format!("invalid upstream server name {host}"))?;
        let tls = connector
            .connect(server_name, tcp)
            .await
            .with_context(|| format!("TLS handshake with {host}:{port}"))?;
        Ok(Box::new(tls))
    }
}

/// The pool described in §4.1: separate cleartext/TLS agent sets, keyed by
/// the keep-alive policy negotiated per transaction.
pub struct AgentPool {
    cleartext: Mutex<HashMap<AgentKey, Arc<Agent>>>,
    tls: Mutex<HashMap<AgentKey, Arc<Agent>>>,
    tls_connector: TlsConnector,
}

impl AgentPool {
    /// Build a pool whose TLS agents validate upstream certificates
    /// against the standard web PKI (the default the underlying TLS stack
    /// would apply; §1 non-goals — the proxy does no extra validation of
    /// its own).
    #[must_use]
    pub fn new() -> Self {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            cleartext: Mutex::new(HashMap::new()),
            tls: Mutex::new(HashMap::new()),
            tls_connector: TlsConnector::from(Arc::new(config)),
        }
    }

    /// Policy of §4.1: return the agent that should carry this outbound
    /// request, creating it on first use.
    pub async fn get(&self, http_version: Version, headers: &HeaderMap, use_tls: bool) -> Arc<Agent> {
        let key = AgentKey::derive(http_version, headers);
        let map = if use_tls { &self.tls } else { &self.cleartext };
        let mut map = map.lock().await;
        map.entry(key)
            .or_insert_with(|| {
                let connector = use_tls.then(|| self.tls_connector.clone());
                Arc::new(Agent::new(key, use_tls, connector))
            })
            .clone()
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                http::header::HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn http_10_without_keep_alive_closes() {
        let key = AgentKey::derive(Version::HTTP_10, &headers(&[]));
        assert_eq!(key, AgentKey::Close);
    }

    #[test]
    fn http_10_with_keep_alive_connection_header_reuses() {
        let key = AgentKey::derive(Version::HTTP_10, &headers(&[("connection", "keep-alive")]));
        assert_eq!(key, AgentKey::Default);
    }

    #[test]
    fn explicit_close_always_wins() {
        let key = AgentKey::derive(Version::HTTP_11, &headers(&[("connection", "close")]));
        assert_eq!(key, AgentKey::Close);
    }

    #[test]
    fn keep_alive_timeout_header_is_honoured() {
        let key = AgentKey::derive(Version::HTTP_11, &headers(&[("keep-alive", "timeout=5, max=100")]));
        assert_eq!(key, AgentKey::TimeoutMs(5000));
    }

    #[test]
    fn malformed_timeout_falls_back_to_default() {
        let key = AgentKey::derive(Version::HTTP_11, &headers(&[("keep-alive", "timeout=nan")]));
        assert_eq!(key, AgentKey::Default);
    }

    #[tokio::test]
    async fn pool_returns_same_agent_for_same_key() {
        let pool = AgentPool::new();
        let a = pool.get(Version::HTTP_11, &headers(&[]), false).await;
        let b = pool.get(Version::HTTP_11, &headers(&[]), false).await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn cleartext_and_tls_pools_are_independent() {
        let pool = AgentPool::new();
        let clear = pool.get(Version::HTTP_11, &headers(&[]), false).await;
        let tls = pool.get(Version::HTTP_11, &headers(&[]), true).await;
        assert!(!Arc::ptr_eq(&clear, &tls));
    }
}
