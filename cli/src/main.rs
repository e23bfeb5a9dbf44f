//! plexq: print a Plex auth token and, optionally, a device's local URI.
//!
//! Credentials come from `PLEX_USERNAME` / `PLEX_PASSWORD` (or the matching
//! flags). Exits 1 on any failure.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use plex_core::config::{RESOURCES_URL, SIGN_IN_URL};
use plex_core::{AuthToken, ClientConfig, Credentials, DeviceUri, Resolver};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "plexq", version)]
#[command(about = "Fetch a Plex auth token and resolve device connection URIs")]
struct Cli {
    /// Device whose local connection URI should be printed
    device: Option<String>,

    /// Plex account username
    #[arg(long, env = "PLEX_USERNAME", hide_env_values = true)]
    username: Option<String>,

    /// Plex account password
    #[arg(long, env = "PLEX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "PLEX_SIGN_IN_URL", default_value = SIGN_IN_URL)]
    sign_in_url: String,

    #[arg(long, env = "PLEX_RESOURCES_URL", default_value = RESOURCES_URL)]
    resources_url: String,

    /// Sent as X-Plex-Client-Identifier (random when unset)
    #[arg(long, env = "PLEX_CLIENT_IDENTIFIER")]
    client_identifier: Option<String>,

    /// Per-request timeout
    #[arg(long, env = "PLEX_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Print a JSON object instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    token: AuthToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<DeviceUri>,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_sign_in_url(&self.sign_in_url)
            .with_resources_url(&self.resources_url)
            .with_timeout(Some(Duration::from_secs(self.timeout_secs)));
        if let Some(id) = &self.client_identifier {
            config = config.with_client_identifier(id);
        }
        config
    }
}

fn run(cli: &Cli) -> Result<Report> {
    let (Some(username), Some(password)) = (&cli.username, &cli.password) else {
        bail!("No user or password");
    };

    let mut resolver = Resolver::new(cli.config()).context("Failed to init libplex")?;
    debug!(sign_in_url = %cli.sign_in_url, "requesting auth token");
    let token = resolver
        .get_auth_token(&Credentials::new(username.as_str(), password.as_str()))
        .context("Failed to get auth token")?;

    let uri = match &cli.device {
        Some(device) => {
            debug!(%device, "resolving device");
            let uri = resolver
                .get_device_uri(&token, device)
                .with_context(|| format!("Failed to get device URI for {device}"))?;
            Some(uri)
        }
        None => None,
    };

    Ok(Report {
        token,
        device: cli.device.clone(),
        uri,
    })
}

fn render(report: &Report, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(report).context("Failed to encode report");
    }
    let mut out = format!("PleX auth token: {}", report.token);
    if let (Some(device), Some(uri)) = (&report.device, &report.uri) {
        out.push_str(&format!("\nDevice URI for {device}: {uri}"));
    }
    Ok(out)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli).and_then(|report| render(&report, cli.json)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn start_server() -> SocketAddr {
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
                mock_server::run(listener).await
            })
            .unwrap();
        });

        addr
    }

    fn cli_for(addr: SocketAddr, extra: &[&str]) -> Cli {
        let sign_in = format!("--sign-in-url=http://{addr}/users/sign_in.xml");
        let resources = format!("--resources-url=http://{addr}/api/resources");
        let mut args = vec![
            "plexq",
            "--username=alice",
            "--password=secret",
            sign_in.as_str(),
            resources.as_str(),
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_point_at_plex() {
        let cli = Cli::try_parse_from(["plexq", "--username=a", "--password=b"]).unwrap();
        assert_eq!(cli.sign_in_url, SIGN_IN_URL);
        assert_eq!(cli.resources_url, RESOURCES_URL);
        assert_eq!(cli.timeout_secs, 30);
        assert!(cli.device.is_none());
        assert!(cli.config().validate().is_ok());
    }

    #[test]
    fn missing_credentials_fail() {
        let cli = Cli {
            device: None,
            username: None,
            password: Some("secret".to_string()),
            sign_in_url: SIGN_IN_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            client_identifier: None,
            timeout_secs: 30,
            json: false,
        };
        let err = run(&cli).unwrap_err();
        assert_eq!(err.to_string(), "No user or password");
    }

    #[test]
    fn prints_token_and_device_uri() {
        let addr = start_server();
        let cli = cli_for(addr, &["Living Room"]);
        let report = run(&cli).unwrap();
        assert_eq!(
            render(&report, false).unwrap(),
            "PleX auth token: ABC123\n\
             Device URI for Living Room: https://192-168-1-20.0123456789abcdef.plex.direct:32400"
        );
    }

    #[test]
    fn json_output() {
        let addr = start_server();
        let cli = cli_for(addr, &["--json"]);
        let report = run(&cli).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&render(&report, cli.json).unwrap()).unwrap();
        assert_eq!(value["token"], "ABC123");
        assert!(value.get("uri").is_none());
    }

    #[test]
    fn unknown_device_reports_context() {
        let addr = start_server();
        let cli = cli_for(addr, &["Garage"]);
        let err = run(&cli).unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to get device URI for Garage"));
    }

    #[test]
    fn zero_timeout_fails_init() {
        let addr = start_server();
        let cli = cli_for(addr, &["--timeout-secs=0"]);
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to init libplex"));
    }
}
