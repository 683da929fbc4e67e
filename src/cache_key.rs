//! Wildcard cache-key derivation for leaf certificates.
//!
//! Hosts that only differ in their left-most label (`a.example.com` vs.
//! `b.example.com`) are served by the same leaf certificate, so the signer
//! and its on-disk cache are keyed by a canonical wildcard form rather than
//! by the exact host.

use std::fmt;

/// The canonical wildcard form of a host name, e.g. `*.example.com`.
///
/// Two hosts whose labels match except for the left-most one always
/// produce the same [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the [`CacheKey`] for `host`.
    ///
    /// - two labels (`example.com`) or more (`a.example.com`) collapse the
    ///   left-most label into a wildcard: `*.example.com`;
    /// - a single label (`localhost`) has no room for a wildcard and is used
    ///   verbatim.
    #[must_use]
    pub fn derive(host: &str) -> Self {
        match host.split_once('.') {
            Some((_, rest)) if !rest.is_empty() => Self(format!("*.{rest}")),
            _ => Self(host.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The directory name this key is persisted under, see [`crate::cache_key::dir_name`].
    #[must_use]
    pub fn dir_name(&self) -> String {
        dir_name(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps a cache key to a bijective on-disk directory name.
///
/// A leading `*` cannot be used as-is in a directory name, so a wildcard key
/// like `*.example.com` is stored as `+.example.com`. A cache key without a
/// wildcard (only ever the bare host itself, e.g. `localhost`) is prefixed
/// with `=` instead, so the mapping stays bijective: unlike a scheme that
/// replaces the first character of a label-less host (which cannot be
/// inverted without guessing it back), a distinct prefix loses nothing.
#[must_use]
pub fn dir_name(cache_key: &str) -> String {
    match cache_key.strip_prefix("*.") {
        Some(rest) => format!("+.{rest}"),
        None => format!("={cache_key}"),
    }
}

/// Inverse of [`dir_name`]: recovers the cache key from a directory name.
///
/// Returns `None` if `name` was not produced by [`dir_name`].
#[must_use]
pub fn cache_key_from_dir_name(name: &str) -> Option<String> {
    if let Some(rest) = name.strip_prefix("+.") {
        Some(format!("*.{rest}"))
    } else {
        name.strip_prefix('=').map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_labels_get_wildcarded() {
        assert_eq!(CacheKey::derive("example.com").as_str(), "*.example.com");
    }

    #[test]
    fn subdomain_collapses_to_same_key_as_its_siblings() {
        let a = CacheKey::derive("a.example.com");
        let b = CacheKey::derive("b.example.com");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "*.example.com");
    }

    #[test]
    fn single_label_host_has_no_wildcard() {
        let key = CacheKey::derive("localhost");
        assert_eq!(key.as_str(), "localhost");
        assert!(!key.as_str().contains('*'));
    }

    #[test]
    fn derived_key_contains_at_most_one_wildcard() {
        for host in ["example.com", "a.b.example.com", "localhost", "a.co"] {
            let key = CacheKey::derive(host);
            assert!(key.as_str().matches('*').count() <= 1);
        }
    }

    #[test]
    fn dir_name_round_trips() {
        for key in ["*.example.com", "localhost"] {
            let dir = dir_name(key);
            assert_eq!(cache_key_from_dir_name(&dir).as_deref(), Some(key));
        }
    }

    #[test]
    fn dir_name_replaces_leading_star() {
        assert_eq!(dir_name("*.example.com"), "+.example.com");
    }

    #[test]
    fn dir_name_marks_non_wildcard_keys_distinctly() {
        assert_eq!(dir_name("localhost"), "=localhost");
    }
}
