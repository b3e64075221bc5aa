//! Shared HTTP helper for every resource.
//!
//! # Design
//! `Client` is a cheap handle around `Arc`'d internals: the validated base
//! URL, the optional bearer token, and the boxed [`Transport`]. Each request
//! is split into a `build_request` step that produces an `HttpRequest` and a
//! `parse_*` step that consumes the `HttpResponse`, with the transport doing
//! the round-trip in between. Resource modules add their own `impl Client`
//! blocks on top of the four verbs here.
//!
//! Wire format: request bodies are wrapped as `{"data": ...}`, responses
//! carry `{"data": ..., "next_page": ...}`, failures carry
//! `{"errors": [{"message": ...}]}`.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::options::{NextPage, Options};
use crate::transport::Transport;

pub(crate) struct ClientInner {
    base_url: String,
    token: Option<String>,
    max_pages: Option<usize>,
    transport: Box<dyn Transport>,
}

/// Synchronous client for the API. Clones share the same transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("token", &self.inner.token.as_ref().map(|_| "<redacted>"))
            .field("max_pages", &self.inner.max_pages)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a, B> {
    data: &'a B,
}

#[derive(Deserialize)]
struct ResponseEnvelope<T> {
    data: T,
    #[serde(default)]
    next_page: Option<NextPage>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    errors: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl Client {
    /// Build a client over the default blocking transport.
    #[cfg(feature = "ureq")]
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = crate::transport::UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    /// Build a client from `ASANA_*` environment variables.
    #[cfg(feature = "ureq")]
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self, ApiError> {
        let base_url = config.validated_base_url()?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                token: config.token,
                max_pages: config.max_pages,
                transport: Box::new(transport),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub(crate) fn max_pages(&self) -> Option<usize> {
        self.inner.max_pages
    }

    pub(crate) fn downgrade(&self) -> Weak<ClientInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(link: &Weak<ClientInner>) -> Option<Self> {
        link.upgrade().map(|inner| Self { inner })
    }

    /// Build the request for `method` on `path` (relative to the base URL).
    pub fn build_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        options: &[Options],
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{path}", self.inner.base_url);
        let query = Options::merge(options).query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = &self.inner.token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match body {
            Some(data) => {
                let encoded = serde_json::to_string(&RequestEnvelope { data })
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.inner.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// GET `path` and decode `data`, returning the cursor when the endpoint
    /// is paged.
    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &[Options],
    ) -> Result<(T, Option<NextPage>), ApiError> {
        let request = self.build_request::<()>(HttpMethod::Get, path, options, None)?;
        parse_data(self.execute(request)?)
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.build_request(HttpMethod::Post, path, &[], Some(body))?;
        parse_data(self.execute(request)?).map(|(data, _)| data)
    }

    pub fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.build_request(HttpMethod::Put, path, &[], Some(body))?;
        parse_data(self.execute(request)?).map(|(data, _)| data)
    }

    pub fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.build_request::<()>(HttpMethod::Delete, path, &[], None)?;
        check_status(&self.execute(request)?)
    }
}

/// Decode the `{"data": ..., "next_page": ...}` envelope of a 2xx response.
pub fn parse_data<T: DeserializeOwned>(response: HttpResponse) -> Result<(T, Option<NextPage>), ApiError> {
    check_status(&response)?;
    let envelope: ResponseEnvelope<T> =
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok((envelope.data, envelope.next_page))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    let body = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(envelope) if !envelope.errors.is_empty() => envelope
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
        _ => response.body.clone(),
    };
    Err(ApiError::HttpError {
        status: response.status,
        body,
    })
}
