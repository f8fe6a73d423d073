use crate::error::SourceError;

/// A named endpoint that serves the same API as its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub name: String,
    pub base_url: String,
}

impl Backend {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Try each backend in order until one succeeds.
///
/// Authentication failures end the search immediately, since another route
/// to the same service will reject the same credentials. Any other failure
/// moves on to the next backend. The last error is returned if all fail.
pub fn try_backends<T, F>(backends: &[Backend], mut attempt: F) -> Result<T, SourceError>
where
    F: FnMut(&Backend) -> Result<T, SourceError>,
{
    let mut last_error = SourceError::NotConnected("no backends configured".to_string());

    for (i, backend) in backends.iter().enumerate() {
        tracing::debug!(
            "{} via {} ({})",
            if i == 0 { "Connecting" } else { "Retrying" },
            backend.name,
            backend.base_url
        );
        match attempt(backend) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_auth() => {
                tracing::warn!("{} rejected credentials: {}", backend.name, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed (backend {}/{}): {}",
                    backend.name,
                    i + 1,
                    backends.len(),
                    e
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}
