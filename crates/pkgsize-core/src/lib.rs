//! # pkgsize-core
//!
//! Core types and utilities shared across all pkgsize crates.
//!
//! This crate provides:
//! - PackageRecord, the parsed view of one registry metadata document
//! - DiscoverySet, the finalized name -> installed size ledger of a traversal
//! - SizeReport, the aggregate computed from a DiscoverySet
//! - PkgSizeError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (PackageRecord, DiscoverySet)
//! - `report`: Aggregation of a finalized DiscoverySet
//! - `error`: Error types and result aliases
//! - `utils`: Size conversion and formatting helpers

pub mod error;
pub mod report;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{PkgSizeError, PkgSizeResult};
pub use report::{aggregate, ReportLine, SizeReport};
pub use types::{DiscoverySet, PackageRecord};
