use thiserror::Error;
use url::Url;

/// Why a record's link will not be handed to the system browser.
#[derive(Error, Debug)]
pub enum LinkValidationError {
    /// The cell is empty or whitespace.
    #[error("Item has no link")]
    Empty,
    /// The link string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The link uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The link has no host to connect to.
    #[error("URL has no host")]
    MissingHost,
}

/// Validate a link cell before opening it externally.
///
/// Sheet contents are untrusted, so only `http`/`https` URLs with a host are
/// accepted; `file:`, `javascript:` and friends are rejected.
///
/// # Examples
///
/// ```
/// use sheetfeed::util::validate_link;
///
/// assert!(validate_link("https://example.com/alert").is_ok());
/// assert!(validate_link("file:///etc/passwd").is_err());
/// assert!(validate_link("").is_err());
/// ```
pub fn validate_link(link: &str) -> Result<Url, LinkValidationError> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return Err(LinkValidationError::Empty);
    }

    let url = Url::parse(trimmed)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(LinkValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(LinkValidationError::MissingHost);
    }

    Ok(url)
}
