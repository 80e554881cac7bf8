//! Metadata configuration source
//!
//! The MetadataSource is responsible for:
//! - Rate limiting refreshes via the PollGate
//! - Fetching the interface document from the metadata service
//! - Correlating it with the host's interfaces
//! - Building and activating an address space on the sink
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌─────────┐   ┌───────────┐
//! │ PollGate │──▶│ MetadataFetcher │──▶│ decode  │──▶│ correlate │
//! └──────────┘   └─────────────────┘   └─────────┘   └───────────┘
//!                                                          │
//!                   ┌───────────────────┐              ▼
//!                   │    AddressSink    │◀──── build (private space)
//!                   │ set_address_space │
//!                   └───────────────────┘
//! ```
//!
//! ## Refresh Flow
//!
//! 1. Suppress the call if the last effective refresh is too recent
//! 2. Fetch and decode the interface document
//! 3. List local interfaces and correlate by MAC address
//! 4. Allocate a fresh address space and populate pools/records
//! 5. Activate the space; this is the only change visible to the sink's consumers
//!
//! Any failure drops the half-built space and leaves the previously active
//! configuration in place. Nothing is retried; the next scheduled tick starts
//! from scratch.

use crate::builder::{self, BuildSummary};
use crate::config::SourceConfig;
use crate::correlate;
use crate::document;
use crate::error::{Error, Result};
use crate::gate::{Clock, PollGate, SystemClock};
use crate::traits::{AddressScope, AddressSink, InterfaceProvider, MetadataFetcher};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Default source name used in logs
pub const DEFAULT_SOURCE_NAME: &str = "metadata";

/// Phases of a single refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Decoding,
    Correlating,
    Building,
    Activated,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Decoding => "decoding",
            Self::Correlating => "correlating",
            Self::Building => "building",
            Self::Activated => "activated",
        };
        f.write_str(name)
    }
}

/// What an activated refresh published
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Document interfaces matched to a local interface
    pub interfaces: usize,
    /// Document interfaces with no local counterpart
    pub skipped_interfaces: usize,
    /// Pools created and reused while building
    pub pools: usize,
    /// Address records registered
    pub records: usize,
    /// Primary addresses left to the host
    pub reserved: usize,
}

/// Result of a successful `refresh()` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Suppressed by the poll gate; nothing was fetched or changed
    Throttled,
    /// A new address space was built and activated
    Activated(RefreshSummary),
}

/// Address configuration source backed by the host metadata service
///
/// ## Lifecycle
///
/// 1. Create with [`MetadataSource::new()`]
/// 2. Bind a sink with [`MetadataSource::start()`]
/// 3. Call [`MetadataSource::refresh()`] from a periodic trigger
/// 4. Unbind with [`MetadataSource::stop()`]
///
/// ## Concurrency
///
/// `refresh()` must not run concurrently with itself; callers serialize it,
/// typically with a single scheduling loop. The poll gate's check-and-update
/// is atomic, but the rest of a refresh is not.
pub struct MetadataSource<S: AddressSink> {
    /// Name used in logs
    name: String,

    /// Retrieves the raw interface document
    fetcher: Box<dyn MetadataFetcher>,

    /// Lists the host's interfaces
    interfaces: Box<dyn InterfaceProvider>,

    /// Minimum-interval gate
    gate: PollGate,

    /// Time source for the gate
    clock: Arc<dyn Clock>,

    /// Identifier of the space built on each refresh
    address_space_id: String,

    /// Scope of the space built on each refresh
    scope: AddressScope,

    /// Bound sink (`None` before start and after stop)
    sink: Option<Arc<S>>,
}

impl<S: AddressSink> MetadataSource<S> {
    /// Create a new source
    ///
    /// # Parameters
    ///
    /// - `fetcher`: Metadata fetcher implementation
    /// - `interfaces`: Local interface provider
    /// - `config`: Source configuration
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate.
    pub fn new(
        fetcher: Box<dyn MetadataFetcher>,
        interfaces: Box<dyn InterfaceProvider>,
        config: &SourceConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            name: DEFAULT_SOURCE_NAME.to_string(),
            fetcher,
            interfaces,
            gate: PollGate::new(config.min_poll_period()),
            clock: Arc::new(SystemClock),
            address_space_id: config.address_space_id.clone(),
            scope: config.scope,
            sink: None,
        })
    }

    /// Replace the time source (tests drive time manually)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The poll gate guarding this source
    pub fn gate(&self) -> &PollGate {
        &self.gate
    }

    /// Whether a sink is bound
    pub fn is_started(&self) -> bool {
        self.sink.is_some()
    }

    /// Bind the sink; no refresh happens before this
    pub fn start(&mut self, sink: Arc<S>) {
        info!("Starting {} source", self.name);
        self.sink = Some(sink);
    }

    /// Unbind the sink; later refreshes fail with [`Error::NotStarted`]
    pub fn stop(&mut self) {
        info!("Stopping {} source", self.name);
        self.sink = None;
    }

    /// Refresh the address configuration
    ///
    /// # Returns
    ///
    /// - `Ok(RefreshOutcome::Throttled)`: Called within the minimum poll period
    /// - `Ok(RefreshOutcome::Activated(_))`: A new space is active on the sink
    /// - `Err(Error)`: The refresh was abandoned; the sink is unchanged
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let sink = self.sink.as_deref().ok_or(Error::NotStarted)?;

        if !self.gate.should_refresh(self.clock.now()) {
            debug!(
                "Refresh of {} suppressed, minimum poll period is {:?}",
                self.name,
                self.gate.min_poll_period()
            );
            return Ok(RefreshOutcome::Throttled);
        }

        let result = self.run(sink).await;
        if let Err(e) = &result {
            debug!("Refresh of {} abandoned: {}", self.name, e);
        }
        self.enter(RefreshPhase::Idle);

        result.map(RefreshOutcome::Activated)
    }

    async fn run(&self, sink: &S) -> Result<RefreshSummary> {
        self.enter(RefreshPhase::Fetching);
        let body = self.fetcher.fetch().await?;
        debug!("Fetched {} bytes from {}", body.len(), self.fetcher.endpoint());

        self.enter(RefreshPhase::Decoding);
        let doc = document::decode(&body)?;
        debug!(
            "Decoded {} interface(s) with {} address(es)",
            doc.interfaces.len(),
            doc.address_count()
        );

        self.enter(RefreshPhase::Correlating);
        let local_interfaces = self.interfaces.interfaces()?;
        let correlated = correlate::correlate(&doc, &local_interfaces);

        self.enter(RefreshPhase::Building);
        let mut space = sink
            .new_address_space(&self.address_space_id, self.scope)
            .await
            .map_err(Error::address_space)?;
        let built: BuildSummary = builder::build(&mut space, &correlated).await?;

        sink.set_address_space(space)
            .await
            .map_err(Error::activation)?;
        self.enter(RefreshPhase::Activated);

        let summary = RefreshSummary {
            interfaces: correlated.len(),
            skipped_interfaces: doc.interfaces.len() - correlated.len(),
            pools: built.pools_created + built.pools_reused,
            records: built.records,
            reserved: built.reserved,
        };
        info!(
            "Activated address space {} ({}): {} interface(s), {} pool(s), {} record(s)",
            self.address_space_id, self.scope, summary.interfaces, summary.pools, summary.records
        );

        Ok(summary)
    }

    fn enter(&self, phase: RefreshPhase) {
        debug!(source = %self.name, %phase, "refresh phase");
    }
}
