//! In-process stand-in for the Plex sign-in and resources endpoints.
//!
//! Serves the two XML endpoints the client talks to, with the same
//! rejections the real service applies: a missing client identifier, a
//! sign-in POST without a content length, bad credentials and unknown
//! tokens. Request counters let tests assert how many round-trips a client
//! made.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use quick_xml::escape::escape;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub token: String,
}

#[derive(Clone, Debug)]
pub struct Device {
    pub name: String,
    pub connections: Vec<Connection>,
}

#[derive(Clone, Debug)]
pub struct Connection {
    pub protocol: String,
    pub uri: String,
    pub local: bool,
}

impl Connection {
    pub fn new(protocol: &str, uri: &str, local: bool) -> Self {
        Self {
            protocol: protocol.to_string(),
            uri: uri.to_string(),
            local,
        }
    }
}

/// Accounts and devices served by the mock, plus request counters.
#[derive(Debug)]
pub struct Directory {
    accounts: Vec<Account>,
    devices: Vec<Device>,
    sign_in_requests: AtomicUsize,
    resource_requests: AtomicUsize,
}

impl Directory {
    pub fn new(accounts: Vec<Account>, devices: Vec<Device>) -> Self {
        Self {
            accounts,
            devices,
            sign_in_requests: AtomicUsize::new(0),
            resource_requests: AtomicUsize::new(0),
        }
    }

    pub fn sign_in_requests(&self) -> usize {
        self.sign_in_requests.load(Ordering::SeqCst)
    }

    pub fn resource_requests(&self) -> usize {
        self.resource_requests.load(Ordering::SeqCst)
    }
}

impl Default for Directory {
    /// `alice` / `secret` with token `ABC123`.
    ///
    /// "Living Room" has a remote connection and two local ones (HTTPS
    /// first); "Office" is reachable only remotely.
    fn default() -> Self {
        Directory::new(
            vec![Account {
                username: "alice".to_string(),
                password: "secret".to_string(),
                token: "ABC123".to_string(),
            }],
            vec![
                Device {
                    name: "Office".to_string(),
                    connections: vec![Connection::new(
                        "https",
                        "https://203-0-113-10.0123456789abcdef.plex.direct:32400",
                        false,
                    )],
                },
                Device {
                    name: "Living Room".to_string(),
                    connections: vec![
                        Connection::new(
                            "https",
                            "https://203-0-113-9.0123456789abcdef.plex.direct:32400",
                            false,
                        ),
                        Connection::new(
                            "https",
                            "https://192-168-1-20.0123456789abcdef.plex.direct:32400",
                            true,
                        ),
                        Connection::new("http", "http://192.168.1.20:32400", true),
                    ],
                },
            ],
        )
    }
}

pub type Shared = Arc<Directory>;

pub fn app() -> Router {
    router(Arc::new(Directory::default()))
}

pub fn router(directory: Shared) -> Router {
    Router::new()
        .route("/users/sign_in.xml", post(sign_in))
        .route("/api/resources", get(resources))
        .with_state(directory)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, directory: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, router(directory)).await
}

async fn sign_in(State(directory): State<Shared>, headers: HeaderMap) -> Response {
    directory.sign_in_requests.fetch_add(1, Ordering::SeqCst);

    if header_str(&headers, "x-plex-client-identifier").is_none() {
        return error_xml(StatusCode::BAD_REQUEST, "X-Plex-Client-Identifier is missing");
    }
    if !headers.contains_key(header::CONTENT_LENGTH) {
        return error_xml(StatusCode::LENGTH_REQUIRED, "Content-Length is required");
    }

    let account = basic_credentials(&headers).and_then(|(username, password)| {
        directory
            .accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
    });
    let Some(account) = account else {
        debug!("sign-in rejected");
        return error_xml(
            StatusCode::UNAUTHORIZED,
            "Invalid email, username, or password.",
        );
    };

    debug!(username = %account.username, "sign-in accepted");
    let body = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<user username="{username}" authenticationToken="{token}">"#,
            "\n  <authentication-token>{token}</authentication-token>\n</user>\n"
        ),
        username = escape(account.username.as_str()),
        token = escape(account.token.as_str()),
    );
    xml(StatusCode::CREATED, body)
}

#[derive(Debug, Deserialize)]
pub struct ResourcesParams {
    #[serde(rename = "includeHttps")]
    pub include_https: Option<u8>,
}

async fn resources(
    State(directory): State<Shared>,
    Query(params): Query<ResourcesParams>,
    headers: HeaderMap,
) -> Response {
    directory.resource_requests.fetch_add(1, Ordering::SeqCst);

    let authorized = header_str(&headers, "x-plex-token")
        .is_some_and(|token| directory.accounts.iter().any(|a| a.token == token));
    if !authorized {
        return error_xml(StatusCode::UNAUTHORIZED, "Invalid token.");
    }

    let include_https = params.include_https == Some(1);
    xml(StatusCode::OK, render_resources(&directory.devices, include_https))
}

/// Render the device directory; HTTPS connections only when requested.
pub fn render_resources(devices: &[Device], include_https: bool) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<MediaContainer size="{}">"#, devices.len()));
    out.push('\n');
    for device in devices {
        out.push_str(&format!(
            r#"  <Device name="{}" product="Plex Media Server" provides="server">"#,
            escape(device.name.as_str())
        ));
        out.push('\n');
        for conn in &device.connections {
            if conn.protocol == "https" && !include_https {
                continue;
            }
            out.push_str(&format!(
                r#"    <Connection protocol="{}" uri="{}" local="{}"/>"#,
                escape(conn.protocol.as_str()),
                escape(conn.uri.as_str()),
                u8::from(conn.local)
            ));
            out.push('\n');
        }
        out.push_str("  </Device>\n");
    }
    out.push_str("</MediaContainer>\n");
    out
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = header_str(headers, "authorization")?.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64_STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn xml(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        body,
    )
        .into_response()
}

fn error_xml(status: StatusCode, message: &str) -> Response {
    xml(
        status,
        format!("<errors><error>{}</error></errors>\n", escape(message)),
    )
}
