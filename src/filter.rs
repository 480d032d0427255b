use url::Url;

/// Schemes that only live as long as the page session and cannot be fetched later
const EPHEMERAL_SCHEMES: [&str; 2] = ["blob:", "data:"];

/// Normalize an image source into an absolute http(s) URL.
///
/// Returns `None` for ephemeral URIs, relative paths and non-http schemes.
/// Protocol-relative sources (`//host/path`) are upgraded to https.
pub fn normalize_image_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if EPHEMERAL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        ::log::trace!("Rejecting ephemeral image source: {:.40}", raw);
        return None;
    }

    let candidate = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(candidate),
        Ok(url) => {
            ::log::debug!("Rejecting image with scheme {}: {}", url.scheme(), candidate);
            None
        }
        Err(_) => {
            ::log::debug!("Rejecting non-absolute image source: {}", candidate);
            None
        }
    }
}
