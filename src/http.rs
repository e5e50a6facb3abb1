//! Blocking HTTP plumbing shared by the release feed and checksum source.
//!
//! Requests go through a `ureq` agent configured with a global timeout, and
//! transport errors are flattened into [`HttpError`] so callers can tell a
//! missing resource (HTTP 404) apart from every other failure.

use std::time::Duration;

/// Errors arising from HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// The server answered 404 Not Found.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that was requested.
        url: String,
    },

    /// The server answered with another non-success status.
    #[error("request to {url} failed with HTTP status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

impl HttpError {
    /// Return `true` if the server reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Build an agent whose requests fail after `timeout`.
#[must_use]
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Fetch `url` and return the body as text.
///
/// `headers` are added to the request in order.
///
/// # Errors
///
/// Returns [`HttpError`] if the request fails, the status is not a success,
/// or the body cannot be read as UTF-8.
pub fn get_text(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(&str, String)],
) -> Result<String, HttpError> {
    let mut request = agent.get(url);
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }
    let response = request.call().map_err(|e| map_ureq_error(url, &e))?;
    response
        .into_body()
        .read_to_string()
        .map_err(|e| HttpError::Transport {
            url: url.to_owned(),
            reason: e.to_string(),
        })
}

/// Map a ureq error to an [`HttpError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> HttpError {
    match err {
        ureq::Error::StatusCode(404) => HttpError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => HttpError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => HttpError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn maps_404_to_not_found() {
        let mapped = map_ureq_error("https://example.test/x", &ureq::Error::StatusCode(404));
        assert!(mapped.is_not_found());
    }

    #[rstest]
    #[case(401)]
    #[case(403)]
    #[case(500)]
    fn maps_other_statuses_to_status_errors(#[case] status: u16) {
        let mapped = map_ureq_error("https://example.test/x", &ureq::Error::StatusCode(status));
        assert_eq!(
            mapped,
            HttpError::Status {
                url: "https://example.test/x".to_owned(),
                status,
            }
        );
    }

    #[test]
    fn maps_transport_failures_with_reason() {
        let err = ureq::Error::BadUri("no scheme".to_owned());
        let mapped = map_ureq_error("https://example.test/x", &err);
        assert!(matches!(mapped, HttpError::Transport { .. }));
        assert!(!mapped.is_not_found());
    }
}
