//! Executing HTTP round-trips.
//!
//! The client never talks to the network itself. It hands each
//! [`HttpRequest`] to a [`Transport`] and interprets the [`HttpResponse`]
//! that comes back, so tests can substitute a scripted transport and
//! applications can plug in their own HTTP stack.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// One blocking HTTP round-trip.
///
/// Implementations return non-2xx responses as data; only failures that
/// produce no response at all (connection refused, timeout) become
/// `ApiError::Transport`. Timeouts and cancellation are the transport's
/// responsibility.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use std::time::Duration;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// `Transport` backed by a blocking `ureq` agent.
    ///
    /// Status-code-as-error is disabled so 4xx/5xx responses are returned as
    /// data, letting the client handle status interpretation.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new(timeout: Option<Duration>) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(None)
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = req.url.as_str();
            let headers = req.headers.as_slice();
            let body = req.body.unwrap_or_default();

            let result = match req.method {
                HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
                HttpMethod::Post => with_headers(self.agent.post(url), headers).send(body.as_bytes()),
                HttpMethod::Put => with_headers(self.agent.put(url), headers).send(body.as_bytes()),
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
