//! Configuration types for the IPAM configuration source
//!
//! This module defines all configuration structures used throughout the crate.

use crate::traits::AddressScope;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known host agent endpoint describing the VM's interfaces
pub const DEFAULT_METADATA_URL: &str =
    "http://169.254.169.254/machine/plugins?comp=nmagent&type=getinterfaceinfov1";

/// Address space the source publishes into
pub const LOCAL_DEFAULT_ADDRESS_SPACE_ID: &str = "LocalDefaultAddressSpace";

/// Main source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Metadata endpoint settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Minimum delay between effective refreshes (in seconds)
    ///
    /// Refresh calls arriving sooner are suppressed. Set to 0 to disable.
    #[serde(default = "default_min_poll_period_secs")]
    pub min_poll_period_secs: u64,

    /// Identifier of the address space built on each refresh
    #[serde(default = "default_address_space_id")]
    pub address_space_id: String,

    /// Scope of the address space built on each refresh
    #[serde(default)]
    pub scope: AddressScope,
}

impl SourceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            metadata: MetadataConfig::default(),
            min_poll_period_secs: default_min_poll_period_secs(),
            address_space_id: default_address_space_id(),
            scope: AddressScope::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.metadata.validate()?;

        if self.address_space_id.trim().is_empty() {
            return Err(crate::Error::config("Address space id cannot be empty"));
        }

        Ok(())
    }

    /// Minimum poll period as a [`Duration`]
    pub fn min_poll_period(&self) -> Duration {
        Duration::from_secs(self.min_poll_period_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// URL queried on every effective refresh
    #[serde(default = "default_metadata_url")]
    pub url: String,

    /// Request timeout (in seconds)
    ///
    /// Bounds how long a refresh can stall the scheduling loop.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MetadataConfig {
    /// Validate the metadata endpoint configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Metadata URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Metadata URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Metadata request timeout must be > 0"));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            url: default_metadata_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_poll_period_secs() -> u64 {
    30
}

fn default_address_space_id() -> String {
    LOCAL_DEFAULT_ADDRESS_SPACE_ID.to_string()
}
