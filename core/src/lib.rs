//! Synchronous client core for the Plex sign-in and device directory API.
//!
//! # Overview
//! Two operations: exchange a username/password for an authentication
//! token, and resolve a device name to the URI of one of its local
//! connections. Both follow the same pipeline: build an `HttpRequest`, run
//! it through a `Session`, parse the body into a `Document`, and pick one
//! value out with a path query.
//!
//! # Design
//! - `PlexClient` is stateless: `build_*` produces requests, `parse_*`
//!   consumes responses, so the I/O boundary stays explicit.
//! - `Resolver` owns the session and performs the round-trip. Creating one
//!   replaces global initialization; dropping it releases everything.
//! - `Transport` is the seam to the network. `UreqTransport` is the real
//!   implementation; tests substitute their own.
//! - Caller-supplied values reach path expressions only through `Literal`.
//!
//! ```no_run
//! use plex_core::{ClientConfig, Credentials, Resolver};
//!
//! let mut resolver = Resolver::new(ClientConfig::default())?;
//! let token = resolver.get_auth_token(&Credentials::new("alice", "secret"))?;
//! let uri = resolver.get_device_uri(&token, "Living Room")?;
//! println!("{uri}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod path;
pub mod resolver;
pub mod session;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::PlexClient;
pub use config::ClientConfig;
pub use error::{AuthError, InitError, InputError, ParseError, QueryError, ResolveError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use path::{Literal, Path, PathBuilder};
pub use resolver::Resolver;
pub use session::{Session, SessionHandle};
pub use transport::UreqTransport;
pub use types::{AuthToken, Credentials, DeviceUri};
pub use xml::{Document, Node, QueryResult};
