// # ipam-core
//
// Core library for the metadata-driven IPAM configuration source.
//
// ## Architecture Overview
//
// This library turns the host metadata service's description of the VM's
// network interfaces into address spaces, pools and records:
// - **PollGate**: Minimum interval between effective refreshes
// - **MetadataFetcher**: Trait for retrieving the raw interface document
// - **document**: Typed XML model and decoder
// - **correlate**: MAC-based matching against local interfaces, priorities
// - **builder**: Pool/record construction inside a private address space
// - **AddressSink**: Trait for the external address-management system
// - **MetadataSource**: The refresh operation wiring all of the above
//
// ## Design Principles
//
// 1. **Narrow seams**: Fetching, interface listing and storage are traits
// 2. **Single publish point**: A space becomes visible only on activation
// 3. **No hidden retries**: A failed refresh waits for the next tick
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod builder;
pub mod config;
pub mod correlate;
pub mod document;
pub mod error;
pub mod gate;
pub mod sink;
pub mod source;
pub mod traits;

// Re-export core types for convenience
pub use config::{MetadataConfig, SourceConfig};
pub use error::{Error, Result};
pub use gate::{Clock, PollGate, SystemClock};
pub use sink::MemoryAddressSink;
pub use source::{MetadataSource, RefreshOutcome, RefreshPhase, RefreshSummary};
pub use traits::{AddressSink, InterfaceProvider, LocalInterface, MetadataFetcher};
