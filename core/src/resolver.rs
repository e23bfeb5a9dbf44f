//! Token and device resolution over a live session.
//!
//! # Design
//! A `Resolver` owns one `Session` and one `PlexClient`. Constructing it is
//! the library's initialization step and dropping it is the cleanup; there
//! is no process-wide state. Each call performs exactly one blocking
//! round-trip. Inputs are validated before any I/O, and a transport failure
//! returns before any parsing is attempted.

use crate::client::{device_connection_path, PlexClient};
use crate::config::ClientConfig;
use crate::error::{AuthError, InitError, ResolveError};
use crate::http::Transport;
use crate::session::Session;
use crate::transport::UreqTransport;
use crate::types::{AuthToken, Credentials, DeviceUri};

#[derive(Debug)]
pub struct Resolver<T = UreqTransport> {
    client: PlexClient,
    session: Session<T>,
}

impl Resolver<UreqTransport> {
    /// Validate `config` and build the HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, InitError> {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Resolver<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, InitError> {
        Ok(Self {
            client: PlexClient::new(config)?,
            session: Session::new(transport),
        })
    }

    pub fn client(&self) -> &PlexClient {
        &self.client
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Exchange credentials for an authentication token.
    pub fn get_auth_token(&mut self, credentials: &Credentials) -> Result<AuthToken, AuthError> {
        let request = self.client.build_sign_in(credentials)?;
        let response = self.session.configure(request).execute()?;
        self.client.parse_sign_in(response)
    }

    /// Resolve `device` to the URI of its first local connection.
    pub fn get_device_uri(
        &mut self,
        token: &AuthToken,
        device: &str,
    ) -> Result<DeviceUri, ResolveError> {
        device_connection_path(device)?;
        let request = self.client.build_list_resources(token);
        let response = self.session.configure(request).execute()?;
        self.client.parse_device_uri(response, device)
    }
}
