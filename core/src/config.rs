//! Client configuration.

use std::time::Duration;

use ureq::http::{HeaderValue, Uri};
use uuid::Uuid;

use crate::error::InitError;

/// Sign-in endpoint of the Plex account service.
pub const SIGN_IN_URL: &str = "https://my.plexapp.com/users/sign_in.xml";

/// Directory of devices registered to an account.
pub const RESOURCES_URL: &str = "https://plex.tv/api/resources";

pub const DEFAULT_PRODUCT: &str = "libplex";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Endpoints and identification headers used by `PlexClient`.
///
/// `Default` targets the public Plex service with a fresh random client
/// identifier. Tests and the CLI override the endpoints to point at a local
/// server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub sign_in_url: String,
    pub resources_url: String,
    /// Sent as `X-Plex-Client-Identifier`.
    pub client_identifier: String,
    /// Sent as `X-Plex-Product`.
    pub product: String,
    /// Sent as `X-Plex-Version`.
    pub version: String,
    /// Applied to every request; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sign_in_url: SIGN_IN_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            client_identifier: Uuid::new_v4().to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    pub fn with_sign_in_url(mut self, url: impl Into<String>) -> Self {
        self.sign_in_url = url.into();
        self
    }

    pub fn with_resources_url(mut self, url: impl Into<String>) -> Self {
        self.resources_url = url.into();
        self
    }

    pub fn with_client_identifier(mut self, id: impl Into<String>) -> Self {
        self.client_identifier = id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), InitError> {
        validate_endpoint("sign-in", &self.sign_in_url)?;
        validate_endpoint("resources", &self.resources_url)?;

        for (header, value) in [
            ("X-Plex-Client-Identifier", &self.client_identifier),
            ("X-Plex-Product", &self.product),
            ("X-Plex-Version", &self.version),
        ] {
            if value.trim().is_empty() || HeaderValue::from_str(value).is_err() {
                return Err(InitError::InvalidHeader { header });
            }
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(InitError::ZeroTimeout);
        }
        Ok(())
    }
}

fn validate_endpoint(field: &'static str, url: &str) -> Result<(), InitError> {
    let invalid = |reason: &str| InitError::InvalidEndpoint {
        field,
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = url.parse().map_err(|_| invalid("not a URI"))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => return Err(invalid("scheme must be http or https")),
    }
    if uri.host().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(())
}
