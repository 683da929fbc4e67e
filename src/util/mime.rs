//! MIME-type extraction for `Accept`-derived content types on synthesised
//! responses (§4.4).

/// First comma-or-semicolon-separated component of `value` that contains a
/// `/` and no `*`, or `text/html` if none qualifies.
///
/// This is deliberately permissive about what precedes the `/`: it is meant
/// to pick a *concrete* type out of an `Accept` header like
/// `text/html,application/xhtml+xml,*/*;q=0.8`, not to validate one.
#[must_use]
pub fn extract(value: &str) -> &str {
    value
        .split([',', ';'])
        .map(str::trim)
        .find(|candidate| candidate.contains('/') && !candidate.contains('*'))
        .unwrap_or("text/html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_concrete_type() {
        assert_eq!(
            extract("text/html,application/xhtml+xml,*/*;q=0.8"),
            "text/html"
        );
    }

    #[test]
    fn skips_leading_wildcards() {
        assert_eq!(extract("*/*,application/json;q=0.9"), "application/json");
    }

    #[test]
    fn falls_back_to_text_html_when_nothing_qualifies() {
        assert_eq!(extract("*/*"), "text/html");
        assert_eq!(extract(""), "text/html");
    }
}
