//! The dynamic, SNI-multiplexed TLS server (C3, §4.3).
//!
//! One listener serves every intercepted host. Certificates are added on
//! first use via [`TlsServer::prepare`] and never removed; the
//! [`rustls::server::ResolvesServerCert`] implementation only ever reads
//! the map that `prepare` populates, so the handshake path never blocks on
//! signing.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::IpAddr;
use std::sync::{Arc, Mutex as StdMutex};

use rama_error::{ErrorContext, OpaqueError};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_rustls::TlsAcceptor;

use crate::cert::{CertMaterial, CertStore};
use crate::{wire, Req, Resp};

/// Resolves a leaf certificate by SNI host name. Populated by
/// [`TlsServer::prepare`], read synchronously during the TLS handshake.
struct HostResolver {
    certs: StdMutex<HashMap<String, Arc<CertifiedKey>>>,
}

impl std::fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostResolver").finish_non_exhaustive()
    }
}

impl ResolvesServerCert for HostResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let name = client_hello.server_name()?;
        #[allow(clippy::unwrap_used)]
        let certs = self.certs.lock().unwrap();
        certs.get(name).cloned()
    }
}

/// The listener described in §4.3, bound to `tls_port` by default 12346.
pub struct TlsServer {
    store: Arc<CertStore>,
    bind_addr: IpAddr,
    port: u16,
    known_hosts: Mutex<HashSet<String>>,
    resolver: Arc<HostResolver>,
}

impl TlsServer {
    #[must_use]
    pub fn new(store: Arc<CertStore>, bind_addr: IpAddr, port: u16) -> Self {
        Self {
            store,
            bind_addr,
            port,
            known_hosts: Mutex::new(HashSet::new()),
            resolver: Arc::new(HostResolver {
                certs: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// Ensure an SNI context for `host` exists (§4.3 `prepare`).
    ///
    /// At most one `sign` call per host reaches C2 (the `knownHosts`
    /// membership check), and the "already known" path still only resolves
    /// after a scheduler tick, matching the asynchrony contract the
    /// "already known" fast path would otherwise violate.
    pub async fn prepare(&self, host: &str) -> Result<(), OpaqueError> {
        {
            let known = self.known_hosts.lock().await;
            if known.contains(host) {
                drop(known);
                tokio::task::yield_now().await;
                return Ok(());
            }
        }

        let material = self.store.sign(host).await?;
        let certified = certified_key(&material)?;

        #[allow(clippy::unwrap_used)]
        self.resolver
            .certs
            .lock()
            .unwrap()
            .insert(host.to_owned(), certified);
        self.known_hosts.lock().await.insert(host.to_owned());
        Ok(())
    }

    /// Accept TLS-terminated connections forever, re-entering `handler` with
    /// the SNI host and a synthesised `https://host/...` request for every
    /// transaction carried over each connection.
    pub async fn serve<F, Fut>(self: Arc<Self>, handler: F) -> Result<(), OpaqueError>
    where
        F: Fn(String, Req) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Option<Resp>> + Send + 'static,
    {
        let listener = TcpListener::bind((self.bind_addr, self.port))
            .await
            .with_context(|| format!("bind dynamic TLS server on {}:{}", self.bind_addr, self.port))?;
        let server_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_cert_resolver(Arc::clone(&self.resolver) as Arc<dyn ResolvesServerCert>);
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        loop {
            let (stream, _peer) = listener
                .accept()
                .await
                .context("accept on dynamic TLS server")?;
            let acceptor = acceptor.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, acceptor, handler).await {
                    tracing::warn!(error = %err, "TLS-terminated connection ended with an error");
                }
            });
        }
    }
}

async fn handle_connection<F, Fut>(
    stream: TcpStream,
    acceptor: TlsAcceptor,
    handler: F,
) -> std::io::Result<()>
where
    F: Fn(String, Req) -> Fut,
    Fut: Future<Output = Option<Resp>>,
{
    let mut tls_stream = acceptor.accept(stream).await?;
    let host = tls_stream
        .get_ref()
        .1
        .server_name()
        .map(str::to_owned)
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "TLS handshake carried no SNI host")
        })?;

    loop {
        let Some(head) = wire::read_request_head(&mut tls_stream).await? else {
            return Ok(());
        };
        let body = wire::read_body(&mut tls_stream, &head.headers, false).await?;
        let keep_alive = !wire::wants_close(&head.headers, head.version);

        let uri = format!("https://{host}{}", head.target);
        let mut builder = rama_http_types::Request::builder()
            .method(head.method)
            .uri(uri)
            .version(head.version);
        if let Some(headers) = builder.headers_mut() {
            *headers = head.headers;
        }
        let request = builder
            .body(body)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

        let Some(response) = handler(host.clone(), request).await else {
            // MalformedClientRequest / UpstreamDial / Deny etc.: silently
            // drop the connection rather than write anything back (§7).
            return Ok(());
        };
        let (parts, body) = response.into_parts();
        wire::write_response_head(&mut tls_stream, parts.status, parts.version, &parts.headers).await?;
        tls_stream.write_all(&body).await?;
        tls_stream.flush().await?;

        if !keep_alive {
            return Ok(());
        }
    }
}

fn certified_key(material: &CertMaterial) -> Result<Arc<CertifiedKey>, OpaqueError> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(material.cert_pem.as_bytes())
        .collect::<Result<_, _>>()
        .context("parse leaf certificate PEM")?;
    let key = PrivateKeyDer::from_pem_slice(material.key_pem.as_bytes())
        .context("parse leaf private key PEM")?;
    let signing_key = rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(OpaqueError::from_std)
        .context("build signing key for leaf certificate")?;
    Ok(Arc::new(CertifiedKey::new(certs, signing_key)))
}
