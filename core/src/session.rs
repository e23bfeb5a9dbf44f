//! Per-request configuration on top of a reusable transport.
//!
//! `Session::configure` hands out a `SessionHandle` that owns the request it
//! was configured with. Executing the handle consumes it, so the session
//! itself never holds method, URL, headers or body from a previous call.
//! `configure` takes `&mut self`: a session is driven from one call site at
//! a time.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    requests_sent: u64,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            requests_sent: 0,
        }
    }

    /// Prepare exactly one request.
    pub fn configure(&mut self, request: HttpRequest) -> SessionHandle<'_, T> {
        SessionHandle {
            session: self,
            request,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of requests handed to the transport so far.
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }
}

/// A configured, not yet executed request.
#[derive(Debug)]
#[must_use = "a configured request does nothing until executed"]
pub struct SessionHandle<'s, T> {
    session: &'s mut Session<T>,
    request: HttpRequest,
}

impl<T: Transport> SessionHandle<'_, T> {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Send the request and block until the full response is captured.
    pub fn execute(self) -> Result<HttpResponse, TransportError> {
        self.session.requests_sent += 1;
        self.session.transport.send(&self.request)
    }
}
