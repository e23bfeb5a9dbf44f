//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Resolver` with the
//! real `UreqTransport` over HTTP. Validates request assembly, the headers
//! the server insists on, and XML extraction together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mock_server::{Account, Connection, Device, Directory};
use plex_core::{
    AuthError, AuthToken, ClientConfig, Credentials, ResolveError, Resolver, TransportError,
};

/// Start the mock server on a random port in a background thread.
fn start_server(directory: Arc<Directory>) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::serve(listener, directory).await
        })
        .unwrap();
    });

    addr
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default()
        .with_sign_in_url(format!("http://{addr}/users/sign_in.xml"))
        .with_resources_url(format!("http://{addr}/api/resources"))
        .with_timeout(Some(Duration::from_secs(5)))
}

#[test]
fn sign_in_then_resolve_device() {
    let directory = Arc::new(Directory::default());
    let addr = start_server(directory.clone());
    let mut resolver = Resolver::new(config_for(addr)).unwrap();

    // Step 1: sign in.
    let token = resolver
        .get_auth_token(&Credentials::new("alice", "secret"))
        .unwrap();
    assert_eq!(token.as_str(), "ABC123");
    assert_eq!(directory.sign_in_requests(), 1);

    // Step 2: resolve the device; the HTTPS local connection comes first.
    let uri = resolver.get_device_uri(&token, "Living Room").unwrap();
    assert_eq!(
        uri.as_str(),
        "https://192-168-1-20.0123456789abcdef.plex.direct:32400"
    );
    assert_eq!(directory.resource_requests(), 1);

    // Step 3: a device with only remote connections.
    let err = resolver.get_device_uri(&token, "Office").unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));

    // Step 4: an unknown device.
    let err = resolver.get_device_uri(&token, "Garage").unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[test]
fn wrong_password_surfaces_status() {
    let addr = start_server(Arc::new(Directory::default()));
    let mut resolver = Resolver::new(config_for(addr)).unwrap();

    let err = resolver
        .get_auth_token(&Credentials::new("alice", "wrong"))
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Transport(TransportError::Status { status: 401, .. })
    ));
}

#[test]
fn unknown_token_surfaces_status() {
    let addr = start_server(Arc::new(Directory::default()));
    let mut resolver = Resolver::new(config_for(addr)).unwrap();

    let err = resolver
        .get_device_uri(&AuthToken::new("stale").unwrap(), "Living Room")
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Status { status: 401, .. })
    ));
}

#[test]
fn only_matching_local_device_is_returned() {
    let directory = Arc::new(Directory::new(
        vec![Account {
            username: "bob".to_string(),
            password: "pw".to_string(),
            token: "TOKEN-B".to_string(),
        }],
        vec![
            Device {
                name: "Den".to_string(),
                connections: vec![Connection::new("http", "http://10.0.0.3:32400", true)],
            },
            Device {
                name: "Bob's \"Den\"".to_string(),
                connections: vec![
                    Connection::new("http", "http://198.51.100.4:32400", false),
                    Connection::new("http", "http://10.0.0.4:32400", true),
                ],
            },
        ],
    ));
    let addr = start_server(directory);
    let mut resolver = Resolver::new(config_for(addr)).unwrap();
    let token = resolver.get_auth_token(&Credentials::new("bob", "pw")).unwrap();

    let uri = resolver.get_device_uri(&token, "Den").unwrap();
    assert_eq!(uri.as_str(), "http://10.0.0.3:32400");

    // Names carrying a double quote are refused, not sent.
    let err = resolver.get_device_uri(&token, "Bob's \"Den\"").unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput(_)));
}

#[test]
fn repeated_lookups_return_same_uri() {
    let directory = Arc::new(Directory::default());
    let addr = start_server(directory.clone());
    let mut resolver = Resolver::new(config_for(addr)).unwrap();
    let token = AuthToken::new("ABC123").unwrap();

    let first = resolver.get_device_uri(&token, "Living Room").unwrap();
    for _ in 0..9 {
        assert_eq!(resolver.get_device_uri(&token, "Living Room").unwrap(), first);
    }
    assert_eq!(directory.resource_requests(), 10);
    assert_eq!(resolver.session().requests_sent(), 10);
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut resolver = Resolver::new(config_for(addr)).unwrap();

    let err = resolver
        .get_auth_token(&Credentials::new("alice", "secret"))
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Transport(TransportError::Request { .. })
    ));

    let err = resolver
        .get_device_uri(&AuthToken::new("ABC123").unwrap(), "Living Room")
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Transport(TransportError::Request { .. })
    ));
}
