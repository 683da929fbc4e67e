//! Root certificate authority: load-or-generate, with validity-based
//! rotation.

use std::fs;
use std::path::Path;

use rama_error::{ErrorContext, OpaqueError};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, PublicKeyData,
};
use time::{Duration, OffsetDateTime};

use super::leaf::subject_alt_names;

const CA_CERT_FILE: &str = "Violentca.crt";
const CA_PUBLIC_FILE: &str = "Violentca.public";
const CA_PRIVATE_FILE: &str = "Violentca.private";

/// CA lifetime, from the moment it is (re)generated.
const CA_LIFETIME: Duration = Duration::weeks(52 * 20);
/// Regenerate once less than this remains.
const CA_ROTATE_THRESHOLD: Duration = Duration::weeks(52 * 3);

/// The signing authority: a self-signed root certificate plus the key pair
/// that issues every leaf.
pub struct CaMaterial {
    pub cert_pem: String,
    pub public_key_pem: String,
    pub private_key_pem: String,
    pub(super) cert: Certificate,
    pub(super) key: KeyPair,
}

impl CaMaterial {
    /// Load the CA from `dir`, generating and persisting a fresh one if
    /// absent or if its remaining validity has dropped below the rotation
    /// threshold.
    ///
    /// A freshly generated CA supersedes leaves signed by the previous one;
    /// the caller is expected to surface a NOTICE-level log for that case,
    /// since those leaves remain trusted by clients until they expire on
    /// their own.
    pub fn load_or_generate(
        dir: &Path,
        proxy_domains: &[String],
        proxy_ips: &[std::net::IpAddr],
    ) -> Result<(Self, bool), OpaqueError> {
        if let Some(existing) = Self::load(dir)? {
            if existing.remaining_validity() >= CA_ROTATE_THRESHOLD {
                return Ok((existing, false));
            }
            tracing::warn!(
                "CA certificate has less than {} left; regenerating (NOTICE: leaves signed \
                 by the old CA remain trusted by clients until they expire on their own)",
                "3 years",
            );
        }
        let generated = Self::generate(proxy_domains, proxy_ips)?;
        generated.persist(dir)?;
        Ok((generated, true))
    }

    fn load(dir: &Path) -> Result<Option<Self>, OpaqueError> {
        let cert_path = dir.join(CA_CERT_FILE);
        let key_path = dir.join(CA_PRIVATE_FILE);
        if !cert_path.exists() || !key_path.exists() {
            return Ok(None);
        }
        let cert_pem =
            fs::read_to_string(&cert_path).with_context(|| format!("read {}", cert_path.display()))?;
        let private_key_pem =
            fs::read_to_string(&key_path).with_context(|| format!("read {}", key_path.display()))?;

        let key = KeyPair::from_pem(&private_key_pem).context("parse CA private key")?;
        let params =
            CertificateParams::from_ca_cert_pem(&cert_pem).context("parse CA certificate")?;
        let cert = params
            .self_signed(&key)
            .context("reconstruct self-signed CA certificate")?;
        let public_key_pem = key.public_key_pem();

        Ok(Some(Self {
            cert_pem,
            public_key_pem,
            private_key_pem,
            cert,
            key,
        }))
    }

    fn generate(
        proxy_domains: &[String],
        proxy_ips: &[std::net::IpAddr],
    ) -> Result<Self, OpaqueError> {
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CountryName, "World");
        dn.push(DnType::OrganizationName, "Violentproxy");
        dn.push(DnType::OrganizationalUnitName, "Violenttls Engine");
        dn.push(DnType::StateOrProvinceName, "World");
        dn.push(DnType::CommonName, "Violentca");
        dn.push(DnType::LocalityName, "World");

        let mut params = CertificateParams::default();
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        params.subject_alt_names = subject_alt_names(proxy_domains, proxy_ips)?;

        let now = OffsetDateTime::now_utc();
        params.not_before = now.checked_sub(Duration::days(1)).unwrap_or(now);
        params.not_after = now.checked_add(CA_LIFETIME).unwrap_or(now);

        // ECDSA P-256, not RSA-2048 (rcgen has no RSA keygen path); see
        // DESIGN.md's Open Question decisions.
        let key = KeyPair::generate().context("generate CA key pair")?;
        let cert = params
            .self_signed(&key)
            .context("self-sign CA certificate")?;

        let cert_pem = cert.pem();
        let public_key_pem = key.public_key_pem();
        let private_key_pem = key.serialize_pem();

        Ok(Self {
            cert_pem,
            public_key_pem,
            private_key_pem,
            cert,
            key,
        })
    }

    fn persist(&self, dir: &Path) -> Result<(), OpaqueError> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create certificate directory {}", dir.display()))?;
        fs::write(dir.join(CA_CERT_FILE), &self.cert_pem).context("write CA certificate")?;
        fs::write(dir.join(CA_PUBLIC_FILE), &self.public_key_pem).context("write CA public key")?;
        fs::write(dir.join(CA_PRIVATE_FILE), &self.private_key_pem)
            .context("write CA private key")?;
        Ok(())
    }

    fn remaining_validity(&self) -> Duration {
        let not_after = self.cert.params().not_after;
        not_after - OffsetDateTime::now_utc()
    }

    pub(super) fn cert(&self) -> &Certificate {
        &self.cert
    }

    pub(super) fn key(&self) -> &KeyPair {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn domains() -> Vec<String> {
        vec!["localhost".to_owned()]
    }

    fn ips() -> Vec<std::net::IpAddr> {
        vec!["127.0.0.1".parse().unwrap()]
    }

    #[test]
    fn generates_once_and_reuses_on_disk_material() {
        let dir = tempdir().unwrap();
        let (first, generated) =
            CaMaterial::load_or_generate(dir.path(), &domains(), &ips()).unwrap();
        assert!(generated);
        assert!(dir.path().join(CA_CERT_FILE).exists());

        let (second, generated_again) =
            CaMaterial::load_or_generate(dir.path(), &domains(), &ips()).unwrap();
        assert!(!generated_again);
        assert_eq!(first.cert_pem, second.cert_pem);
    }

    #[test]
    fn fresh_ca_has_twenty_year_validity() {
        let dir = tempdir().unwrap();
        let (ca, _) = CaMaterial::load_or_generate(dir.path(), &domains(), &ips()).unwrap();
        assert!(ca.remaining_validity() >= CA_ROTATE_THRESHOLD);
    }
}
