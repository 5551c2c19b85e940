use url::Url;

/// Normalizes a URL for dedup-key comparison: lowercased scheme and host,
/// fragment dropped, single trailing slash removed. Unparseable input is
/// returned trimmed, so malformed keys still dedup against themselves.
pub fn normalize_url_for_dedup(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    parsed.set_fragment(None);
    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }
    let mut normalized = parsed.to_string();
    if parsed.path() == "/" && parsed.query().is_none() && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::normalize_url_for_dedup;

    #[test]
    fn fragment_and_trailing_slash_are_dropped() {
        assert_eq!(
            normalize_url_for_dedup("https://a.example.com/items/#top"),
            "https://a.example.com/items"
        );
    }

    #[test]
    fn host_and_scheme_are_lowercased() {
        assert_eq!(
            normalize_url_for_dedup("HTTPS://A.Example.COM/Path"),
            "https://a.example.com/Path"
        );
    }

    #[test]
    fn bare_origin_variants_collapse() {
        assert_eq!(
            normalize_url_for_dedup("https://a.example.com/"),
            normalize_url_for_dedup("https://a.example.com")
        );
    }

    #[test]
    fn query_is_preserved() {
        assert_eq!(
            normalize_url_for_dedup("https://a.example.com/search?q=1"),
            "https://a.example.com/search?q=1"
        );
    }

    #[test]
    fn unparseable_input_is_trimmed_only() {
        assert_eq!(normalize_url_for_dedup("  not a url  "), "not a url");
    }
}
