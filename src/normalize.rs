//! URL normalization.
//!
//! Reduces a URL to a comparable identity: the domain form strips scheme,
//! `www.` and everything after the host; the url form keeps
//! path/query/fragment. Two URLs differing only in scheme or a `www.`
//! prefix normalize identically.

use anyhow::{anyhow, Result};
use url::Url;

/// Reduce a URL to its bare domain: no scheme, no `www.`, no path.
pub fn normalize_domain(raw: &str) -> Result<String> {
    let parsed = parse_lenient(raw)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("url '{raw}' has no host"))?;
    Ok(strip_www(host).to_string())
}

/// Reduce a full URL to a comparable form: bare domain plus
/// path, query and fragment.
pub fn normalize_url(raw: &str) -> Result<String> {
    let parsed = parse_lenient(raw)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("url '{raw}' has no host"))?;

    let mut normalized = strip_www(host).to_string();
    normalized.push_str(parsed.path());
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        normalized.push('#');
        normalized.push_str(fragment);
    }
    Ok(normalized)
}

/// Parse a URL, tolerating a missing scheme ("example.com/a" parses the
/// same as "https://example.com/a").
fn parse_lenient(raw: &str) -> Result<Url> {
    match Url::parse(raw) {
        Ok(parsed) if parsed.has_host() => Ok(parsed),
        // "example.com:8080/a" parses as scheme "example.com" with no host;
        // retry those with a scheme prepended, like the bare-host case.
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{raw}"))
                .map_err(|err| anyhow!("unparseable url '{raw}': {err}"))
        }
        Err(err) => Err(anyhow!("unparseable url '{raw}': {err}")),
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_ignores_scheme_and_www() {
        let variants = [
            "https://www.example.com/a/b?q=1",
            "http://example.com/other",
            "www.example.com",
            "example.com",
        ];
        for raw in variants {
            assert_eq!(normalize_domain(raw).unwrap(), "example.com", "{raw}");
        }
    }

    #[test]
    fn url_ignores_scheme_and_www() {
        let a = normalize_url("https://www.example.com/a/b?q=1#frag").unwrap();
        let b = normalize_url("http://example.com/a/b?q=1#frag").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "example.com/a/b?q=1#frag");
    }

    #[test]
    fn url_keeps_path_query_fragment() {
        assert_eq!(
            normalize_url("https://docs.rs/tokio/latest?search=mpsc").unwrap(),
            "docs.rs/tokio/latest?search=mpsc"
        );
    }

    #[test]
    fn subdomains_are_preserved() {
        assert_eq!(
            normalize_domain("https://mail.example.com/inbox").unwrap(),
            "mail.example.com"
        );
    }

    #[test]
    fn unparseable_input_is_an_error() {
        assert!(normalize_domain("http://").is_err());
        assert!(normalize_url("///").is_err());
    }
}
