//! Stateless request builder and response parser for the Plex API.
//!
//! # Design
//! `PlexClient` holds only its validated `ClientConfig`. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. `Resolver` runs the
//! round-trip in between; FFI callers and tests can drive the two halves
//! directly.
//!
//! Every parse creates its `Document` locally and returns owned values, so
//! the tree is dropped before the method returns on every path.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::config::ClientConfig;
use crate::error::{AuthError, InitError, InputError, ResolveError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::{Literal, PathBuilder};
use crate::types::{AuthToken, Credentials, DeviceUri};
use crate::xml::Document;

pub const CLIENT_IDENTIFIER_HEADER: &str = "X-Plex-Client-Identifier";
pub const PRODUCT_HEADER: &str = "X-Plex-Product";
pub const VERSION_HEADER: &str = "X-Plex-Version";
pub const TOKEN_HEADER: &str = "X-Plex-Token";

#[derive(Debug, Clone)]
pub struct PlexClient {
    config: ClientConfig,
}

impl PlexClient {
    pub fn new(config: ClientConfig) -> Result<Self, InitError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST to the sign-in endpoint with basic credentials and an explicitly
    /// empty body.
    pub fn build_sign_in(&self, credentials: &Credentials) -> Result<HttpRequest, AuthError> {
        if credentials.username.contains(':') {
            return Err(InputError::InvalidUsername.into());
        }
        let basic = BASE64_STANDARD.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));

        let mut headers = self.identification_headers();
        headers.push(("Authorization".to_string(), format!("Basic {basic}")));

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.config.sign_in_url.clone(),
            headers,
            // Some servers reject a POST without a content length.
            body: Some(Vec::new()),
            timeout: self.config.timeout,
        })
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<AuthToken, AuthError> {
        check_status(&response, &self.config.sign_in_url)?;

        let document = Document::parse(&response.body)?;
        let matches = document.query(&auth_token_path())?;
        let text = matches.first().map(|node| node.text()).ok_or(AuthError::NotFound)?;

        let token = text.trim();
        if token.is_empty() {
            return Err(AuthError::NotFound);
        }
        Ok(AuthToken::new(token)?)
    }

    /// GET the device directory, HTTPS-capable connections included.
    pub fn build_list_resources(&self, token: &AuthToken) -> HttpRequest {
        let url = &self.config.resources_url;
        let separator = if url.contains('?') { '&' } else { '?' };

        let mut headers = self.identification_headers();
        headers.push((TOKEN_HEADER.to_string(), token.as_str().to_string()));

        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{url}{separator}includeHttps=1"),
            headers,
            body: None,
            timeout: self.config.timeout,
        }
    }

    /// Extract the `uri` of the first local connection of `device`.
    pub fn parse_device_uri(
        &self,
        response: HttpResponse,
        device: &str,
    ) -> Result<DeviceUri, ResolveError> {
        let expression = device_connection_path(device)?;
        check_status(&response, &self.config.resources_url)?;

        let document = Document::parse(&response.body)?;
        let matches = document.query(&expression)?;
        matches
            .first()
            .and_then(|node| node.attribute("uri"))
            .map(DeviceUri::new)
            .ok_or_else(|| ResolveError::NotFound {
                device: device.to_string(),
            })
    }

    fn identification_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/xml".to_string()),
            (
                CLIENT_IDENTIFIER_HEADER.to_string(),
                self.config.client_identifier.clone(),
            ),
            (PRODUCT_HEADER.to_string(), self.config.product.clone()),
            (VERSION_HEADER.to_string(), self.config.version.clone()),
        ]
    }
}

/// `/user/authentication-token/text()`
pub fn auth_token_path() -> String {
    PathBuilder::root("user").child("authentication-token").text()
}

/// `/MediaContainer/Device[@name="<device>"]/Connection[@local=1]`
///
/// Fails with `InputError::UnsafeLiteral` when `device` contains `"`.
pub fn device_connection_path(device: &str) -> Result<String, InputError> {
    let name = Literal::quoted(device)?;
    Ok(PathBuilder::root("MediaContainer")
        .child("Device")
        .attr_eq("name", &name)
        .child("Connection")
        .attr_eq("local", &Literal::number(1))
        .build())
}

/// Map a non-2xx status to `TransportError::Status`.
fn check_status(response: &HttpResponse, url: &str) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        url: url.to_string(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"<MediaContainer size="2">
  <Device name="Office" product="Plex Media Server">
    <Connection protocol="https" uri="https://203-0-113-9.abc.plex.direct:32400" local="0"/>
    <Connection protocol="https" uri="https://10-0-0-5.abc.plex.direct:32400" local="1"/>
  </Device>
  <Device name="Cabin" product="Plex Media Server">
    <Connection protocol="https" uri="https://198-51-100-7.def.plex.direct:32400" local="0"/>
  </Device>
</MediaContainer>"#;

    fn client() -> PlexClient {
        PlexClient::new(ClientConfig::default().with_client_identifier("test-client")).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = PlexClient::new(ClientConfig::default().with_sign_in_url("")).unwrap_err();
        assert!(matches!(err, InitError::InvalidEndpoint { .. }));
    }

    #[test]
    fn build_sign_in_produces_correct_request() {
        let req = client()
            .build_sign_in(&Credentials::new("alice", "secret"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://my.plexapp.com/users/sign_in.xml");
        assert_eq!(req.body, Some(Vec::new()));
        assert_eq!(req.header(CLIENT_IDENTIFIER_HEADER), Some("test-client"));
        assert_eq!(req.header(PRODUCT_HEADER), Some("libplex"));
        // base64("alice:secret")
        assert_eq!(req.header("Authorization"), Some("Basic YWxpY2U6c2VjcmV0"));
        assert!(req.header(TOKEN_HEADER).is_none());
    }

    #[test]
    fn build_sign_in_rejects_colon_in_username() {
        let err = client()
            .build_sign_in(&Credentials::new("al:ice", "secret"))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(InputError::InvalidUsername)));
    }

    #[test]
    fn parse_sign_in_extracts_token() {
        let resp = response(
            201,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<user email="alice@example.com" username="alice">
  <authentication-token>ABC123</authentication-token>
</user>"#,
        );
        let token = client().parse_sign_in(resp).unwrap();
        assert_eq!(token.as_str(), "ABC123");
    }

    #[test]
    fn parse_sign_in_missing_token_is_not_found() {
        let resp = response(201, r#"<user username="alice"><email>a@example.com</email></user>"#);
        assert!(matches!(
            client().parse_sign_in(resp).unwrap_err(),
            AuthError::NotFound
        ));

        let blank = response(201, "<user><authentication-token>  </authentication-token></user>");
        assert!(matches!(
            client().parse_sign_in(blank).unwrap_err(),
            AuthError::NotFound
        ));
    }

    #[test]
    fn parse_sign_in_unauthorized_is_transport_status() {
        let resp = response(401, "<errors><error>Invalid credentials</error></errors>");
        let err = client().parse_sign_in(resp).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Transport(TransportError::Status { status: 401, .. })
        ));
    }

    #[test]
    fn parse_sign_in_bad_xml_is_parse_error() {
        let err = client().parse_sign_in(response(201, "{\"user\":{}}")).unwrap_err();
        assert!(matches!(err, AuthError::Parse(_)));
        let err = client().parse_sign_in(response(200, "")).unwrap_err();
        assert!(matches!(err, AuthError::Parse(crate::error::ParseError::Empty)));
    }

    #[test]
    fn build_list_resources_produces_correct_request() {
        let token = AuthToken::new("ABC123").unwrap();
        let req = client().build_list_resources(&token);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://plex.tv/api/resources?includeHttps=1");
        assert_eq!(req.header(TOKEN_HEADER), Some("ABC123"));
        assert!(req.body.is_none());
        assert!(req.header("Authorization").is_none());
    }

    #[test]
    fn resources_url_with_query_keeps_it() {
        let client = PlexClient::new(
            ClientConfig::default().with_resources_url("http://localhost:3000/api/resources?x=1"),
        )
        .unwrap();
        let req = client.build_list_resources(&AuthToken::new("t").unwrap());
        assert_eq!(req.url, "http://localhost:3000/api/resources?x=1&includeHttps=1");
    }

    #[test]
    fn parse_device_uri_picks_local_connection_of_named_device() {
        let uri = client()
            .parse_device_uri(response(200, RESOURCES), "Office")
            .unwrap();
        assert_eq!(uri.as_str(), "https://10-0-0-5.abc.plex.direct:32400");
    }

    #[test]
    fn parse_device_uri_without_local_connection_is_not_found() {
        let err = client()
            .parse_device_uri(response(200, RESOURCES), "Cabin")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { device } if device == "Cabin"));

        let err = client()
            .parse_device_uri(response(200, RESOURCES), "Garage")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn parse_device_uri_rejects_quote_in_name() {
        let err = client()
            .parse_device_uri(response(200, RESOURCES), r#"Office"] | //*[@x=""#)
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidInput(InputError::UnsafeLiteral(_))
        ));
    }

    #[test]
    fn device_path_never_contains_input_quotes() {
        for name in ["Office", "Bob's TV", "Living Room [4K]", "a/b", "ü"] {
            let expr = device_connection_path(name).unwrap();
            assert_eq!(expr.matches('"').count(), 2, "{expr}");
        }
        assert!(device_connection_path("say \"hi\"").is_err());
    }

    #[test]
    fn device_names_with_apostrophes_and_brackets_resolve() {
        let body = r#"<MediaContainer>
  <Device name="Bob's TV [4K]"><Connection uri="http://10.0.0.9:32400" local="1"/></Device>
</MediaContainer>"#;
        let uri = client()
            .parse_device_uri(response(200, body), "Bob's TV [4K]")
            .unwrap();
        assert_eq!(uri.as_str(), "http://10.0.0.9:32400");
    }

    #[test]
    fn local_connection_without_uri_is_not_found() {
        let body = r#"<MediaContainer><Device name="Office"><Connection local="1"/></Device></MediaContainer>"#;
        let err = client()
            .parse_device_uri(response(200, body), "Office")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }
}
