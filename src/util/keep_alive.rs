//! Hand-rolled parser for the `Keep-Alive` request header (§4.1 policy 2).
//!
//! `rama-http-headers` has no typed header for it — unlike `Connection` or
//! `Content-Length`, `Keep-Alive` never made it into an RFC, it is just a
//! comma-separated set of `key=value` pairs by convention.

/// The `timeout=T` parameter, in seconds, out of a `Keep-Alive` header
/// value such as `timeout=5, max=1000`.
///
/// Returns `None` if no `timeout` parameter is present, or if its value is
/// not a finite positive number (the malformed-`T` case is ignored, not
/// rejected, per §4.1).
#[must_use]
pub fn timeout_secs(value: &str) -> Option<f64> {
    value.split(',').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("timeout") {
            let secs: f64 = value.trim().parse().ok()?;
            (secs.is_finite() && secs > 0.0).then_some(secs)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timeout_among_other_params() {
        assert_eq!(timeout_secs("timeout=5, max=1000"), Some(5.0));
    }

    #[test]
    fn is_case_insensitive_and_tolerates_whitespace() {
        assert_eq!(timeout_secs(" Max=10, Timeout = 2 "), Some(2.0));
    }

    #[test]
    fn ignores_malformed_or_missing_timeout() {
        assert_eq!(timeout_secs("max=1000"), None);
        assert_eq!(timeout_secs("timeout=abc"), None);
        assert_eq!(timeout_secs("timeout=-5"), None);
        assert_eq!(timeout_secs("timeout=nan"), None);
    }
}
