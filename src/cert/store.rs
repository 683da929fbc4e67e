//! Race-free, wildcard-aware leaf certificate cache (§4.2 `sign`).

use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rama_error::{ErrorContext, OpaqueError};
use rcgen::SanType;
use tokio::sync::oneshot;

use crate::cache_key::{self, CacheKey};

use super::ca::CaMaterial;
use super::leaf::{self, LEAF_ROTATE_THRESHOLD};

const LEAF_CERT_FILE: &str = "Violentcert.crt";
const LEAF_PUBLIC_FILE: &str = "Violentcert.public";
const LEAF_PRIVATE_FILE: &str = "Violentcert.private";

/// A signed certificate/private-key pair, PEM-encoded, ready to hand to a
/// TLS listener.
#[derive(Debug, Clone)]
pub struct CertMaterial {
    pub cert_pem: String,
    pub key_pem: String,
}

/// The lifecycle of one cache entry: exactly one signing operation in
/// flight, a FIFO queue of callers waiting on it, or the settled result.
enum Slot {
    Pending(Vec<oneshot::Sender<CertMaterial>>),
    Ready(CertMaterial),
}

/// Owns the CA, the proxy-self leaf, and the `CacheKey -> CertEntry` map.
pub struct CertStore {
    cert_dir: PathBuf,
    ca: Arc<CaMaterial>,
    proxy_self: CertMaterial,
    entries: Mutex<HashMap<String, Slot>>,
}

impl CertStore {
    /// Load-or-generate the CA and the proxy-self leaf, per §4.2 `init`.
    pub async fn init(
        cert_dir: impl Into<PathBuf>,
        proxy_domains: Vec<String>,
        proxy_ips: Vec<IpAddr>,
    ) -> Result<Self, OpaqueError> {
        let cert_dir = cert_dir.into();

        let dir = cert_dir.clone();
        let domains = proxy_domains.clone();
        let ips = proxy_ips.clone();
        let (ca, regenerated) = tokio::task::spawn_blocking(move || {
            CaMaterial::load_or_generate(&dir, &domains, &ips)
        })
        .await
        .context("CA init task panicked")??;
        if regenerated {
            tracing::warn!(dir = %cert_dir.display(), "generated a new CA certificate");
        }
        let ca = Arc::new(ca);

        let self_host = proxy_domains
            .first()
            .cloned()
            .unwrap_or_else(|| "localhost".to_owned());
        let key = CacheKey::derive(&self_host);
        let entry_dir = cert_dir.join(cache_key::dir_name(key.as_str()));
        let sans = leaf::subject_alt_names(&proxy_domains, &proxy_ips)?;
        let ca_for_task = Arc::clone(&ca);
        let self_host_for_task = self_host.clone();
        let proxy_self = tokio::task::spawn_blocking(move || {
            load_or_generate_leaf(&entry_dir, &self_host_for_task, sans, &ca_for_task)
        })
        .await
        .context("proxy-self leaf init task panicked")??;

        Ok(Self {
            cert_dir,
            ca,
            proxy_self,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// The proxy's own certificate/key pair, for a plaintext-upgraded-to-TLS
    /// main listener (`useTLS = true`).
    #[must_use]
    pub fn proxy_self_leaf(&self) -> &CertMaterial {
        &self.proxy_self
    }

    /// The CA certificate, PEM-encoded, e.g. for a client-trust bundle.
    #[must_use]
    pub fn ca_cert_pem(&self) -> &str {
        &self.ca.cert_pem
    }

    /// Sign (or fetch from cache) the leaf certificate for `host`.
    ///
    /// Always resolves on a later scheduler tick than the call, even when
    /// the value is already cached (§5's asynchrony contract). The cached
    /// path explicitly `yield_now`s before handing back the reply, since a
    /// `oneshot` channel resolves on its very first poll once `send` has
    /// already run — without the yield, a cache hit would return within the
    /// caller's own synchronous frame, the exact "resolves ready
    /// synchronously" bug class §9 calls out.
    pub async fn sign(&self, host: &str) -> Result<CertMaterial, OpaqueError> {
        let key = CacheKey::derive(host);
        let (tx, rx) = oneshot::channel();
        let mut should_generate = false;
        {
            let mut entries = self.entries.lock().expect("cert store poisoned");
            match entries.get_mut(key.as_str()) {
                Some(Slot::Ready(material)) => {
                    // Cache hit: force a scheduler tick before replying, same
                    // as `TlsServer::prepare`'s already-known fast path.
                    let material = material.clone();
                    drop(entries);
                    tokio::task::yield_now().await;
                    let _ = tx.send(material);
                    return rx.await.context("certificate signer task dropped the reply channel");
                }
                Some(Slot::Pending(waiters)) => {
                    waiters.push(tx);
                }
                None => {
                    entries.insert(key.as_str().to_owned(), Slot::Pending(vec![tx]));
                    should_generate = true;
                }
            }
        }

        if should_generate {
            self.generate_or_load(host, key).await;
        }

        rx.await
            .context("certificate signer task dropped the reply channel")
    }

    async fn generate_or_load(&self, host: &str, key: CacheKey) {
        let sans = match leaf::subject_alt_names_for_host(host) {
            Ok(sans) => sans,
            Err(err) => {
                // Unreachable in practice: the connect/request engines only
                // ever call `sign` with a host that already passed their own
                // validation. Fail the waiters rather than panic the whole
                // process over a single bad host.
                tracing::error!(%host, error = %err, "invalid host reached the certificate signer");
                self.drain(&key, None);
                return;
            }
        };

        let entry_dir = self.cert_dir.join(cache_key::dir_name(key.as_str()));
        let host = host.to_owned();
        let ca = Arc::clone(&self.ca);
        let result =
            tokio::task::spawn_blocking(move || load_or_generate_leaf(&entry_dir, &host, sans, &ca))
                .await;

        match result {
            Ok(Ok(material)) => self.drain(&key, Some(material)),
            Ok(Err(err)) => {
                crate::fatal::fatal("leaf certificate signing or persistence failed", err);
            }
            Err(join_err) => {
                crate::fatal::fatal(
                    "leaf certificate signing task panicked",
                    OpaqueError::from_display(join_err),
                );
            }
        }
    }

    fn drain(&self, key: &CacheKey, material: Option<CertMaterial>) {
        let waiters = {
            let mut entries = self.entries.lock().expect("cert store poisoned");
            match material.clone() {
                Some(material) => {
                    let previous = entries.insert(key.as_str().to_owned(), Slot::Ready(material));
                    match previous {
                        Some(Slot::Pending(waiters)) => waiters,
                        _ => Vec::new(),
                    }
                }
                None => match entries.remove(key.as_str()) {
                    Some(Slot::Pending(waiters)) => waiters,
                    _ => Vec::new(),
                },
            }
        };
        if let Some(material) = material {
            for waiter in waiters {
                let _ = waiter.send(material.clone());
            }
        }
        // Waiters enqueued while `material` is `None` are simply dropped;
        // their `rx.await` resolves to a closed-channel error, which the
        // caller (the connect/request engine) treats like any other
        // malformed-request failure: the connection is silently dropped.
    }
}

/// Load a cached leaf from disk if present and outside the rotation window,
/// else sign a fresh one and persist it.
fn load_or_generate_leaf(
    entry_dir: &Path,
    host: &str,
    sans: Vec<SanType>,
    ca: &CaMaterial,
) -> Result<CertMaterial, OpaqueError> {
    if let Some(material) = try_load(entry_dir)? {
        if leaf::remaining_validity(&material.cert_pem)? >= LEAF_ROTATE_THRESHOLD {
            return Ok(material);
        }
    }

    let signed = leaf::sign(host, sans, ca)?;
    let material = CertMaterial {
        cert_pem: signed.cert_pem,
        key_pem: signed.key_pem,
    };
    persist(entry_dir, &material, &signed.public_key_pem)?;
    Ok(material)
}

fn try_load(entry_dir: &Path) -> Result<Option<CertMaterial>, OpaqueError> {
    let cert_path = entry_dir.join(LEAF_CERT_FILE);
    let key_path = entry_dir.join(LEAF_PRIVATE_FILE);
    if !cert_path.exists() || !key_path.exists() {
        return Ok(None);
    }
    let cert_pem =
        fs::read_to_string(&cert_path).with_context(|| format!("read {}", cert_path.display()))?;
    let key_pem =
        fs::read_to_string(&key_path).with_context(|| format!("read {}", key_path.display()))?;
    Ok(Some(CertMaterial { cert_pem, key_pem }))
}

/// Write the `.crt`/`.public`/`.private` triple. All three are written
/// before the in-memory entry is promoted to `Ready` by the caller, so a
/// concurrent `loadCert` never observes a partial triple.
fn persist(entry_dir: &Path, material: &CertMaterial, public_key_pem: &str) -> Result<(), OpaqueError> {
    fs::create_dir_all(entry_dir)
        .with_context(|| format!("create certificate directory {}", entry_dir.display()))?;
    fs::write(entry_dir.join(LEAF_CERT_FILE), &material.cert_pem).context("write leaf certificate")?;
    fs::write(entry_dir.join(LEAF_PUBLIC_FILE), public_key_pem).context("write leaf public key")?;
    fs::write(entry_dir.join(LEAF_PRIVATE_FILE), &material.key_pem)
        .context("write leaf private key")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store(dir: &Path) -> CertStore {
        CertStore::init(
            dir.to_path_buf(),
            vec!["localhost".to_owned()],
            vec!["127.0.0.1".parse().unwrap()],
        )
        .await
        .expect("store init")
    }

    #[tokio::test]
    async fn signs_and_caches_a_leaf() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let first = store.sign("example.com").await.unwrap();
        let second = store.sign("example.com").await.unwrap();
        assert_eq!(first.cert_pem, second.cert_pem);

        let entry_dir = dir.path().join(cache_key::dir_name("*.example.com"));
        assert!(entry_dir.join(LEAF_CERT_FILE).exists());
    }

    #[tokio::test]
    async fn wildcard_siblings_share_one_signing_operation() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let a = store.sign("a.example.com").await.unwrap();
        let b = store.sign("b.example.com").await.unwrap();
        assert_eq!(a.cert_pem, b.cert_pem);
    }

    #[tokio::test]
    async fn sign_does_not_resolve_synchronously_when_cached() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        store.sign("example.com").await.unwrap();

        let mut task = tokio_test::task::spawn(store.sign("example.com"));
        assert!(
            task.poll().is_pending(),
            "a cache hit must not resolve on its very first poll (§5/§8 property 3)"
        );
        match task.poll() {
            std::task::Poll::Ready(result) => {
                assert!(result.is_ok());
            }
            std::task::Poll::Pending => panic!("sign() never resolved after being woken"),
        }
    }

    #[tokio::test]
    async fn concurrent_signs_for_the_same_host_coalesce() {
        let dir = tempdir().unwrap();
        let store = Arc::new(store(dir.path()).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(
                async move { store.sign("foo.example.com").await.unwrap() },
            ));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        let first = &results[0].cert_pem;
        assert!(results.iter().all(|m| &m.cert_pem == first));
    }
}
