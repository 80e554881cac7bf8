// # ipamd - IPAM Configuration Source Daemon
//
// Thin integration layer around ipam-core:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the HTTP fetcher, the pnet interface provider and the in-memory sink
// 4. Triggering refresh() on a fixed schedule until SIGTERM/SIGINT
//
// All discovery logic lives in ipam-core. A failed refresh is logged and the
// next tick starts over; there is no retry logic here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `IPAM_METADATA_URL`: Interface document endpoint (default: host agent URL)
// - `IPAM_REQUEST_TIMEOUT_SECS`: Metadata request timeout (default: 10)
// - `IPAM_MIN_POLL_PERIOD_SECS`: Minimum delay between refreshes (default: 30)
// - `IPAM_REFRESH_INTERVAL_SECS`: Scheduler tick, 1-3600 (default: 30)
// - `IPAM_ADDRESS_SPACE_ID`: Published address space (default: LocalDefaultAddressSpace)
// - `IPAM_SCOPE`: Address space scope, local or global (default: local)
// - `IPAM_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export IPAM_REFRESH_INTERVAL_SECS=60
// export IPAM_LOG_LEVEL=debug
//
// ipamd
// ```

use anyhow::Result;
use ipam_core::config::{DEFAULT_METADATA_URL, LOCAL_DEFAULT_ADDRESS_SPACE_ID, MetadataConfig};
use ipam_core::traits::AddressScope;
use ipam_core::{MemoryAddressSink, MetadataSource, RefreshOutcome, SourceConfig};
use ipam_iface_pnet::PnetInterfaceProvider;
use ipam_metadata_http::HttpMetadataFetcher;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IpamExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IpamExitCode> for ExitCode {
    fn from(code: IpamExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MIN_POLL_PERIOD_SECS: u64 = 30;

/// Application configuration
#[derive(Debug)]
struct Config {
    metadata_url: String,
    request_timeout_secs: u64,
    min_poll_period_secs: u64,
    refresh_interval_secs: u64,
    address_space_id: String,
    scope: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(value) => value.trim().parse().map_err(|_| {
                    anyhow::anyhow!("{} must be a whole number of seconds. Got: {}", key, value)
                }),
                None => Ok(default),
            }
        };

        Ok(Self {
            metadata_url: lookup("IPAM_METADATA_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            request_timeout_secs: number(
                "IPAM_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            min_poll_period_secs: number(
                "IPAM_MIN_POLL_PERIOD_SECS",
                DEFAULT_MIN_POLL_PERIOD_SECS,
            )?,
            refresh_interval_secs: number(
                "IPAM_REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            address_space_id: lookup("IPAM_ADDRESS_SPACE_ID")
                .unwrap_or_else(|| LOCAL_DEFAULT_ADDRESS_SPACE_ID.to_string()),
            scope: lookup("IPAM_SCOPE").unwrap_or_else(|| "local".to_string()),
            log_level: lookup("IPAM_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.refresh_interval_secs) {
            anyhow::bail!(
                "IPAM_REFRESH_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                self.refresh_interval_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPAM_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.source_config()?.validate()?;

        Ok(())
    }

    /// Build the library configuration
    fn source_config(&self) -> Result<SourceConfig> {
        let scope = match self.scope.to_lowercase().as_str() {
            "local" => AddressScope::Local,
            "global" => AddressScope::Global,
            _ => anyhow::bail!(
                "IPAM_SCOPE '{}' is not supported. Supported scopes: local, global",
                self.scope
            ),
        };

        Ok(SourceConfig {
            metadata: MetadataConfig {
                url: self.metadata_url.clone(),
                timeout_secs: self.request_timeout_secs,
            },
            min_poll_period_secs: self.min_poll_period_secs,
            address_space_id: self.address_space_id.clone(),
            scope,
        })
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IpamExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IpamExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpamExitCode::ConfigError.into();
    }

    info!("Starting ipamd daemon");
    info!(
        "Metadata endpoint: {} (refresh every {}s, min poll period {}s)",
        config.metadata_url, config.refresh_interval_secs, config.min_poll_period_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpamExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            IpamExitCode::RuntimeError
        } else {
            IpamExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let source_config = config.source_config()?;

    let fetcher = HttpMetadataFetcher::from_config(&source_config.metadata)?;
    let sink = Arc::new(MemoryAddressSink::new());

    let mut source = MetadataSource::new(
        Box::new(fetcher),
        Box::new(PnetInterfaceProvider::new()),
        &source_config,
    )?;
    source.start(sink.clone());
    info!("Source '{}' started", source.name());

    let mut interval = tokio::time::interval(config.refresh_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                let signal = signal?;
                info!("Received shutdown signal: {}", signal);
                break;
            }
            Some(_) = ticks.next() => {
                refresh_once(&source, &sink).await;
            }
        }
    }

    info!("Shutting down daemon");
    source.stop();
    Ok(())
}

/// Run one scheduled refresh and report its outcome
async fn refresh_once(source: &MetadataSource<MemoryAddressSink>, sink: &MemoryAddressSink) {
    match source.refresh().await {
        Ok(RefreshOutcome::Throttled) => {
            debug!("Refresh throttled");
        }
        Ok(RefreshOutcome::Activated(_)) => {
            if let Some(active) = sink.active().await {
                match serde_json::to_string(&active) {
                    Ok(json) => debug!("Active address space: {}", json),
                    Err(e) => warn!("Failed to serialize active address space: {}", e),
                }
            }
        }
        Err(e) => {
            warn!("Refresh failed, waiting for next tick: {}", e);
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
