use tracing::trace;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Canonicalises a raw URL string into something the fetcher can request.
///
/// Surrounding whitespace is trimmed and `https://` is prepended when the
/// input carries neither `http://` nor `https://`. Blank input normalises to
/// an empty string, which callers treat as "do not fetch".
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if trimmed.starts_with(HTTP_PREFIX) || trimmed.starts_with(HTTPS_PREFIX) {
        trimmed.to_string()
    } else {
        trace!("Adding https scheme to {}", trimmed);
        format!("{}{}", HTTPS_PREFIX, trimmed)
    }
}
