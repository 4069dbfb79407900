//! External URL normalization.
//!
//! Posts and link submissions point at third-party pages. URLs are stored in
//! a canonical form so feeds and announcements never carry `javascript:` or
//! other non-web schemes.

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes a URL to a canonical form.
///
/// - Only `http` and `https` are accepted
/// - Host is lowercased
/// - Default ports (80/443) and fragments are removed
/// - Path and query are preserved as-is
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs and
/// [`UrlNormalizationError::UnsupportedProtocol`] for other schemes.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

/// Normalizes an optional form field: blank input means "no URL".
///
/// # Errors
///
/// See [`normalize_url`].
pub fn normalize_optional_url(
    input: Option<&str>,
) -> Result<Option<String>, UrlNormalizationError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => normalize_url(url).map(Some),
    }
}
