//! Unit tests for CLI commands.

use super::*;
use std::io::Cursor;

use clap::Parser;
use pkgsize_core::types::PackageRecord;
use pkgsize_registry::MemorySource;
use std::time::Duration;
use tempfile::TempDir;

/// Create a test command context in a temporary directory
fn create_test_context(temp_dir: &TempDir) -> CommandContext {
    CommandContext {
        cwd: Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap(),
        output: crate::output::OutputHandler::plain(),
    }
}

fn memory_session(source: MemorySource) -> Session {
    Session::with_source(Arc::new(source), &Settings::default(), ReportFormat::Json)
}

fn read_names(input: &str) -> (Vec<String>, String) {
    let mut reader = Cursor::new(input.as_bytes().to_vec());
    let mut writer = Vec::new();
    let mut names = Vec::new();
    while let Some(name) = prompt::read_package_name(&mut reader, &mut writer).unwrap() {
        names.push(name);
    }
    (names, String::from_utf8(writer).unwrap())
}

#[test]
fn test_prompt_rejects_empty_input() {
    let (names, transcript) = read_names("\n   \nexpress\n");

    assert_eq!(names, vec!["express".to_string()]);
    assert_eq!(transcript.matches("-- Your input was empty").count(), 2);
    assert_eq!(transcript.matches("Enter a package name: ").count(), 4);
}

#[test]
fn test_prompt_trims_and_stops_at_eof() {
    let (names, _) = read_names("  leftpad  \nreact");

    assert_eq!(names, vec!["leftpad".to_string(), "react".to_string()]);
}

#[test]
fn test_cli_parsing() {
    let cli = crate::Cli::try_parse_from([
        "pkgsize",
        "express",
        "@types/node",
        "--registry",
        "https://npm.example.com",
        "--max-concurrent",
        "4",
        "--no-cache",
        "--json",
    ])
    .unwrap();

    assert_eq!(cli.packages, vec!["express", "@types/node"]);
    assert_eq!(cli.registry.as_deref(), Some("https://npm.example.com"));
    assert_eq!(cli.max_concurrent, Some(4));
    assert!(cli.no_cache);
    assert!(cli.json);
    assert!(!cli.verbose);
}

#[test]
fn test_cli_without_packages_is_interactive() {
    let cli = crate::Cli::try_parse_from(["pkgsize", "-v"]).unwrap();

    assert!(cli.packages.is_empty());
    assert!(cli.verbose);
}

#[tokio::test]
async fn test_measure_app_with_library() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let session = memory_session(
        MemorySource::new()
            .with("app", 2048, &["lib"])
            .with("lib", 4096, &[]),
    );

    let outcome = measure::measure(&session, " app ", &ctx).await.unwrap();

    assert_eq!(outcome.root, "app");
    assert_eq!(outcome.report().total_bytes, 6144);
}

#[tokio::test]
async fn test_execute_all_reports_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let session = memory_session(MemorySource::new().with("leftpad", 1024, &[]));

    let found = measure::execute_all(&session, &["leftpad".to_string()], &ctx)
        .await
        .unwrap();
    assert!(found);

    let found = measure::execute_all(
        &session,
        &["leftpad".to_string(), "does-not-exist".to_string()],
        &ctx,
    )
    .await
    .unwrap();
    assert!(!found);
}

#[tokio::test]
async fn test_execute_all_skips_blank_names() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let source = Arc::new(MemorySource::new().with("leftpad", 1024, &[]));
    let session = Session::with_source(source.clone(), &Settings::default(), ReportFormat::Json);

    let found = measure::execute_all(&session, &["  ".to_string(), "leftpad".to_string()], &ctx)
        .await
        .unwrap();

    assert!(!found);
    assert_eq!(source.total_fetches(), 1);
}

#[tokio::test]
async fn test_session_rejects_invalid_registry() {
    let settings = Settings {
        registry_url: "not a url".to_string(),
        ..Settings::default()
    };

    assert!(Session::from_settings(&settings, ReportFormat::Text).is_err());
}

#[tokio::test]
async fn test_load_settings_from_project_file() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("pkgsize.toml"),
        "[traversal]\nmax-concurrent-fetches = 3\n",
    )
    .unwrap();
    let ctx = create_test_context(&temp_dir);
    let cli = crate::Cli::try_parse_from(["pkgsize", "--no-cache"]).unwrap();

    let settings = load_settings(&cli, &ctx).await.unwrap();

    assert_eq!(settings.max_concurrent_fetches, 3);
    assert!(!settings.cache_enabled);
}

#[tokio::test]
async fn test_measure_evicts_stale_cache_entries() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let cache = Arc::new(MetadataCache::new());
    cache.insert_with_ttl("old".to_string(), PackageRecord::new("old", "1.0.0", 1), Duration::ZERO);
    cache.insert("fresh".to_string(), PackageRecord::new("fresh", "1.0.0", 2));

    let mut session = memory_session(MemorySource::new().with("leftpad", 1024, &[]));
    session.cache = Some(cache.clone());

    measure::measure(&session, "leftpad", &ctx).await.unwrap();

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 1);
    assert!(cache.contains_fresh("fresh"));
}
