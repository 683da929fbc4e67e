//! Per-host leaf certificate issuance.

use std::net::IpAddr;
use std::str::FromStr;

use rama_error::{ErrorContext, OpaqueError};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, Ia5String, KeyPair,
    KeyUsagePurpose, PublicKeyData, SanType,
};
use time::{Duration, OffsetDateTime};

use super::ca::CaMaterial;

/// Leaf lifetime, from the moment it is signed.
pub(super) const LEAF_LIFETIME: Duration = Duration::weeks(104);
/// Regenerate once less than this remains.
pub(super) const LEAF_ROTATE_THRESHOLD: Duration = Duration::weeks(8);

/// A signed leaf certificate and the private key it was issued with, both
/// still in rcgen's in-memory form (callers that only need the PEM bytes
/// should go through [`super::store::CertMaterial`] instead).
pub(super) struct SignedLeaf {
    pub(super) cert_pem: String,
    pub(super) key_pem: String,
    pub(super) public_key_pem: String,
}

/// Build the `subjectAltName` list for a host: the DNS name itself plus the
/// wildcard covering its siblings, or its literal IP if `host` parses as one.
pub(super) fn subject_alt_names_for_host(host: &str) -> Result<Vec<SanType>, OpaqueError> {
    if let Ok(ip) = IpAddr::from_str(host) {
        return Ok(vec![SanType::IpAddress(ip)]);
    }
    let mut sans = vec![dns_san(host)?];
    if let Some((_, rest)) = host.split_once('.') {
        if !rest.is_empty() {
            sans.push(dns_san(&format!("*.{rest}"))?);
        }
    }
    Ok(sans)
}

/// Build the `subjectAltName` list for the proxy-self leaf: every configured
/// domain and IP, verbatim (no wildcarding - these are the proxy's own
/// listener names).
pub(super) fn subject_alt_names(
    domains: &[String],
    ips: &[IpAddr],
) -> Result<Vec<SanType>, OpaqueError> {
    let mut sans = Vec::with_capacity(domains.len() + ips.len());
    for domain in domains {
        sans.push(dns_san(domain)?);
    }
    for ip in ips {
        sans.push(SanType::IpAddress(*ip));
    }
    Ok(sans)
}

fn dns_san(name: &str) -> Result<SanType, OpaqueError> {
    Ia5String::try_from(name)
        .map(SanType::DnsName)
        .map_err(|_| rama_error::error!("{name} is not a valid DNS name for a certificate SAN"))
}

/// Sign a leaf certificate for `host`, using `sans` as its `subjectAltName`
/// set (see [`subject_alt_names_for_host`] and [`subject_alt_names`]).
pub(super) fn sign(host: &str, sans: Vec<SanType>, ca: &CaMaterial) -> Result<SignedLeaf, OpaqueError> {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "World");
    dn.push(DnType::OrganizationName, "Violentproxy");
    dn.push(DnType::OrganizationalUnitName, "Violenttls Engine");
    dn.push(DnType::StateOrProvinceName, "World");
    dn.push(DnType::CommonName, "Violentserver");
    dn.push(DnType::LocalityName, "World");

    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.subject_alt_names = sans;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::DataEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];

    let now = OffsetDateTime::now_utc();
    params.not_before = now.checked_sub(Duration::days(1)).unwrap_or(now);
    params.not_after = now.checked_add(LEAF_LIFETIME).unwrap_or(now);

    // ECDSA P-256, not RSA-2048 (rcgen has no RSA keygen path); see
    // DESIGN.md's Open Question decisions.
    let key = KeyPair::generate().with_context(|| format!("generate leaf key pair for {host}"))?;
    let cert = params
        .signed_by(&key, ca.cert(), ca.key())
        .with_context(|| format!("sign leaf certificate for {host}"))?;

    Ok(SignedLeaf {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
        public_key_pem: key.public_key_pem(),
    })
}

/// Remaining validity of a PEM-encoded leaf certificate, used to decide
/// whether a cached-on-disk leaf must be regenerated.
///
/// `CertificateParams::from_ca_cert_pem` only reads the params back out of an
/// existing PEM (the name is misleading: it does not require the
/// certificate to actually be a CA), which is all we need `not_after` for.
pub(super) fn remaining_validity(cert_pem: &str) -> Result<Duration, OpaqueError> {
    let params =
        CertificateParams::from_ca_cert_pem(cert_pem).context("parse cached leaf certificate")?;
    Ok(params.not_after - OffsetDateTime::now_utc())
}
