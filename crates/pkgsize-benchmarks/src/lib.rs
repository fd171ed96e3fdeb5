//! pkgsize benchmarking suite
//!
//! Benchmarks for the traversal engine, report aggregation and registry
//! document parsing, all run against synthetic in-memory data.

pub mod common;

pub use common::*;
