//! Blocking HTTP transport backed by `ureq`.

use std::time::Duration;

use tracing::{debug, trace};
use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Production `Transport`: one `ureq::Agent` reused across requests.
///
/// The agent keeps its connection pool between calls, but every
/// per-request setting (headers, body, timeout) comes from the
/// `HttpRequest` being sent. 4xx/5xx responses are returned as data so the
/// caller decides what a status means.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(default_timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(default_timeout)
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

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        for (name, _) in &request.headers {
            trace!(header = %name, "request header");
        }

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let builder = with_headers(self.agent.get(&request.url), &request.headers);
                with_timeout(builder, request.timeout).call()
            }
            (HttpMethod::Post, Some(body)) => {
                let builder = with_headers(self.agent.post(&request.url), &request.headers);
                with_timeout(builder, request.timeout).send(body)
            }
            (HttpMethod::Post, None) => {
                let builder = with_headers(self.agent.post(&request.url), &request.headers);
                with_timeout(builder, request.timeout).send_empty()
            }
        };

        let mut response = result.map_err(|source| TransportError::Request {
            method: request.method,
            url: request.url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        // read_to_vec either returns the whole body or fails; a truncated
        // body never reaches the caller.
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|source| TransportError::Body {
                url: request.url.clone(),
                source,
            })?;

        debug!(status, bytes = body.len(), url = %request.url, "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn with_timeout<B>(builder: RequestBuilder<B>, timeout: Option<Duration>) -> RequestBuilder<B> {
    match timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}
