//! Error types for the IPAM configuration source
//!
//! This module defines all error types used throughout the crate.

use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for IPAM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IPAM configuration source
///
/// Every variant aborts the refresh that produced it. A throttled refresh is
/// not an error (see [`RefreshOutcome::Throttled`](crate::RefreshOutcome)).
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata service could not be reached or answered with a failure
    #[error("Metadata fetch failed: {0}")]
    Fetch(String),

    /// The metadata document could not be decoded
    #[error("Metadata document decode failed: {0}")]
    Decode(String),

    /// A subnet prefix in the document is not a valid CIDR network
    #[error("Invalid subnet prefix '{prefix}': {reason}")]
    InvalidSubnet {
        /// The prefix as it appeared in the document
        prefix: String,
        /// Parser message
        reason: String,
    },

    /// An address literal in the document is not a valid IP address
    #[error("Invalid IP address '{0}'")]
    InvalidAddress(String),

    /// The sink refused to create an address pool
    #[error("Address pool creation failed: {0}")]
    PoolCreation(String),

    /// The sink refused to create an address record
    #[error("Address record creation failed for {address}: {message}")]
    RecordCreation {
        /// The address being registered
        address: IpAddr,
        /// Sink message
        message: String,
    },

    /// The sink could not allocate a fresh address space
    #[error("Address space allocation failed: {0}")]
    AddressSpace(String),

    /// The sink refused to activate the built address space
    #[error("Address space activation failed: {0}")]
    Activation(String),

    /// The local network interfaces could not be listed
    #[error("Local interface query failed: {0}")]
    InterfaceQuery(String),

    /// `refresh()` was called while no sink is bound
    #[error("Source is not started")]
    NotStarted,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid subnet error
    pub fn invalid_subnet(prefix: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidSubnet {
            prefix: prefix.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress(address.into())
    }

    /// Create a pool creation error
    pub fn pool_creation(msg: impl Into<String>) -> Self {
        Self::PoolCreation(msg.into())
    }

    /// Create a record creation error
    pub fn record_creation(address: IpAddr, message: impl ToString) -> Self {
        Self::RecordCreation {
            address,
            message: message.to_string(),
        }
    }

    /// Create an address space allocation error
    pub fn address_space(msg: impl ToString) -> Self {
        Self::AddressSpace(msg.to_string())
    }

    /// Create an activation error
    pub fn activation(msg: impl ToString) -> Self {
        Self::Activation(msg.to_string())
    }

    /// Create an interface query error
    pub fn interface_query(msg: impl Into<String>) -> Self {
        Self::InterfaceQuery(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
