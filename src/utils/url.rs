//! URL helpers for routing CLI input

use url::Url;

/// Check if URL points at a playlist (`list=` query or `/playlist` path)
pub fn is_playlist_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            parsed.path().starts_with("/playlist")
                || parsed.query_pairs().any(|(key, _)| key == "list")
        }
        Err(_) => false,
    }
}

/// Expand a bare channel handle such as `@Zdak` into its shorts feed URL.
///
/// Anything else is returned unchanged.
pub fn feed_url(input: &str) -> String {
    let input = input.trim();
    match input.strip_prefix('@') {
        Some(handle) if !handle.is_empty() && !handle.contains('/') => {
            format!("https://www.youtube.com/@{}/shorts", handle)
        }
        _ => input.to_string(),
    }
}
