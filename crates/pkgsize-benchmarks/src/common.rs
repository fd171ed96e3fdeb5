//! Common utilities for benchmarks

use std::time::Duration;

use criterion::Criterion;
use pkgsize_core::types::DiscoverySet;
use pkgsize_registry::MemorySource;
use pprof::criterion::{Output, PProfProfiler};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(10))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Name of node `index` on `level` of a layered registry
pub fn node_name(level: usize, index: usize) -> String {
    format!("pkg-{}-{}", level, index)
}

/// Registry of `levels` layers of `width` packages under a single `root`.
///
/// Every package depends on all packages of the next layer, so each name is
/// reachable through `width` edges and the dedup path is exercised heavily.
pub fn layered_registry(levels: usize, width: usize, latency: Option<Duration>) -> MemorySource {
    let mut source = MemorySource::new();

    let first: Vec<String> = (0..width).map(|i| node_name(0, i)).collect();
    let first_refs: Vec<&str> = first.iter().map(String::as_str).collect();
    source = source.with("root", 1024, &first_refs);

    for level in 0..levels {
        let next: Vec<String> = if level + 1 < levels {
            (0..width).map(|i| node_name(level + 1, i)).collect()
        } else {
            Vec::new()
        };
        let next_refs: Vec<&str> = next.iter().map(String::as_str).collect();
        for index in 0..width {
            let size = 1024 * (1 + (level * width + index) as u64 % 97);
            source = source.with(&node_name(level, index), size, &next_refs);
        }
    }

    match latency {
        Some(latency) => source.with_latency(latency),
        None => source,
    }
}

/// Discovery set of `count` packages with varied sizes
pub fn synthetic_discovery_set(count: usize) -> DiscoverySet {
    (0..count)
        .map(|i| (format!("package-{:06}", i), (i as u64 * 7919) % 5_000_000))
        .collect()
}

/// Registry document with `versions` published versions, `deps` dependencies each
pub fn synthetic_metadata_document(name: &str, versions: usize, deps: usize) -> String {
    let dependencies: serde_json::Map<String, serde_json::Value> = (0..deps)
        .map(|i| (format!("dep-{}", i), serde_json::Value::from("^1.0.0")))
        .collect();

    let versions_map: serde_json::Map<String, serde_json::Value> = (0..versions)
        .map(|i| {
            let version = format!("1.{}.0", i);
            let document = serde_json::json!({
                "name": name,
                "version": version,
                "dependencies": dependencies,
                "dist": {
                    "tarball": format!("https://registry.npmjs.org/{}/-/{}-{}.tgz", name, name, version),
                    "unpackedSize": 10_000 + i,
                    "fileCount": 12
                }
            });
            (version, document)
        })
        .collect();

    serde_json::json!({
        "name": name,
        "dist-tags": { "latest": format!("1.{}.0", versions.saturating_sub(1)) },
        "versions": versions_map
    })
    .to_string()
}
