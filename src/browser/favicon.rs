//! External favicon lookup helper. Pure URL formatting, no side effects.

/// Favicon URL for a bare domain, via Google's favicon endpoint.
pub fn favicon_url(domain: &str, size: u32) -> String {
    format!("https://www.google.com/s2/favicons?domain={domain}&sz={size}")
}
