//! Conformance tests that run YAML fixtures against matchmerge
//!
//! Run with: cargo test -p matchmerge-test --test conformance --features fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use matchmerge_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// The `fixtures/` directory at the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");

    // Go up: ext/test -> ext -> workspace root
    let root = Path::new(manifest_dir)
        .parent()
        .and_then(Path::parent)
        .expect("Could not find workspace root");

    root.join("fixtures")
}

/// Load every fixture in a directory
fn load_fixtures(dir: &Path) -> Vec<Fixture> {
    assert!(dir.exists(), "Fixtures directory does not exist: {}", dir.display());

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    paths.sort();

    let mut fixtures = Vec::new();
    for path in paths {
        let yaml = fs::read_to_string(&path).expect("read yaml");
        let parsed = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });
        fixtures.extend(parsed);
    }
    fixtures
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    for fixture in load_fixtures(dir) {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_paths() {
    run_fixtures_in_dir(&fixtures_dir().join("01_paths"));
}

#[test]
fn test_scalars() {
    run_fixtures_in_dir(&fixtures_dir().join("02_scalars"));
}

#[test]
fn test_objects() {
    run_fixtures_in_dir(&fixtures_dir().join("03_objects"));
}

#[test]
fn test_arrays() {
    run_fixtures_in_dir(&fixtures_dir().join("04_arrays"));
}

#[test]
fn test_diagnostics() {
    run_fixtures_in_dir(&fixtures_dir().join("05_diagnostics"));
}
