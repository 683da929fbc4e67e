//! `violentproxy`: start the intercepting proxy from the command line.
//!
//! Configuration can be supplied as flags, as a JSON file (`--config`), or
//! both — flags always win over whatever the file sets, the file wins over
//! [`Config::default`]. The patcher installed here is the crate's stock
//! default (§4.6): allow everything, inject a greeting `<script>` tag into
//! textual responses. Embedders that need their own patcher should depend
//! on this crate as a library and call [`violentproxy::Engine::init`]
//! directly instead of running this binary.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rama_error::{BoxError, ErrorContext};
use tokio_graceful::Shutdown;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use violentproxy::{Config, Engine};
use violentproxy::config::LogLevel;
use violentproxy::patcher::Patcher;

/// An intercepting HTTP/HTTPS proxy with on-the-fly certificate signing.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Load configuration from a JSON file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address the main listener binds to.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port of the main listener (forward-HTTP and CONNECT entry point).
    #[arg(long)]
    port: Option<u16>,

    /// Port of the dynamic SNI-multiplexed TLS server (C3).
    #[arg(long)]
    tls_port: Option<u16>,

    /// Serve the main listener over TLS using the proxy-self leaf.
    #[arg(long)]
    use_tls: bool,

    /// A DNS name the proxy-self leaf certificate should cover; repeatable.
    #[arg(long = "proxy-domain")]
    proxy_domains: Vec<String>,

    /// An IP address the proxy-self leaf certificate should cover; repeatable.
    #[arg(long = "proxy-ip")]
    proxy_ips: Vec<IpAddr>,

    /// Root directory holding the CA and per-host leaf certificate material.
    #[arg(long)]
    cert_dir: Option<PathBuf>,

    /// Verbosity: 0=silent, 1=error, 2=+warning, 3=+notice, 4=+info.
    #[arg(long)]
    log_level: Option<u8>,
}

impl Cli {
    fn into_config(self) -> Result<Config, BoxError> {
        let mut config = match self.config {
            Some(path) => Config::from_file(&path)?,
            None => Config::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(tls_port) = self.tls_port {
            config.tls_port = tls_port;
        }
        if self.use_tls {
            config.use_tls = true;
        }
        if !self.proxy_domains.is_empty() {
            config.proxy_domains = self.proxy_domains;
        }
        if !self.proxy_ips.is_empty() {
            config.proxy_ips = self.proxy_ips;
        }
        if let Some(cert_dir) = self.cert_dir {
            config.cert_dir = cert_dir;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = LogLevel::try_from(log_level)?;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = cli.into_config()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(config.log_level.as_level_filter().into())
                .from_env_lossy(),
        )
        .init();

    let engine = Engine::init(config, Patcher::new())
        .await
        .context("initialise proxy engine")?;
    tracing::info!(
        ca_pem_bytes = engine.ca_cert_pem().len(),
        "certificate authority ready; install its certificate in your client's trust store",
    );

    let shutdown = Shutdown::default();
    shutdown.spawn_task_fn(|guard| async move {
        if let Err(err) = engine.run(guard).await {
            tracing::error!(error = %err, "proxy engine exited with an error");
        }
    });

    shutdown
        .shutdown_with_limit(Duration::from_secs(30))
        .await
        .context("graceful shutdown")?;
    Ok(())
}
