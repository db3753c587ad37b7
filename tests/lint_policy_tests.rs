#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Manifest policy tests for the bingo client.
//!
//! These tests verify that `Cargo.toml` keeps the panic-free lint set, the
//! feature layout the transports rely on, and a declared MSRV. If any test
//! fails, the manifest has drifted from the agreed-upon standards.

use std::path::PathBuf;

use toml::{Table, Value};

/// Lints that must be `deny` so non-test code never panics.
const PANIC_FREE_LINTS: &[&str] = &[
    "unwrap_used",
    "expect_used",
    "panic",
    "todo",
    "unimplemented",
    "indexing_slicing",
];

/// Returns the project root directory (where Cargo.toml lives).
fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn manifest() -> Table {
    let path = project_root().join("Cargo.toml");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {e}", path.display()));
    toml::from_str(&text).expect("Cargo.toml must be valid TOML")
}

fn table<'a>(parent: &'a Table, key: &str) -> &'a Table {
    parent
        .get(key)
        .and_then(Value::as_table)
        .unwrap_or_else(|| panic!("Cargo.toml is missing [{key}]"))
}

#[test]
fn clippy_panic_lints_are_denied() {
    let manifest = manifest();
    let clippy = table(table(&manifest, "lints"), "clippy");
    for lint in PANIC_FREE_LINTS {
        assert_eq!(
            clippy.get(*lint).and_then(Value::as_str),
            Some("deny"),
            "Cargo.toml must set `{lint} = \"deny\"` in [lints.clippy]. \
             All panic-prone lints must be denied to keep library code panic-free."
        );
    }
}

#[test]
fn websocket_transport_is_default_and_pulls_in_runtime() {
    let manifest = manifest();
    let features = table(&manifest, "features");
    let names = |key: &str| -> Vec<String> {
        features
            .get(key)
            .and_then(Value::as_array)
            .unwrap_or_else(|| panic!("feature `{key}` is missing"))
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    };

    assert!(names("default").contains(&"transport-websocket".to_owned()));
    let websocket = names("transport-websocket");
    for required in ["dep:tokio-tungstenite", "dep:futures-util", "tokio-runtime"] {
        assert!(
            websocket.contains(&required.to_owned()),
            "transport-websocket must enable `{required}`"
        );
    }
    assert_eq!(names("tokio-runtime"), ["tokio/rt", "tokio/time"]);
}

#[test]
fn transport_dependencies_stay_optional() {
    let manifest = manifest();
    let deps = table(&manifest, "dependencies");
    for name in ["tokio-tungstenite", "futures-util"] {
        let optional = deps
            .get(name)
            .and_then(Value::as_table)
            .and_then(|t| t.get("optional"))
            .and_then(Value::as_bool);
        assert_eq!(optional, Some(true), "`{name}` must be an optional dependency");
    }
}

#[test]
fn msrv_is_declared() {
    let manifest = manifest();
    let version = table(&manifest, "package")
        .get("rust-version")
        .and_then(Value::as_str)
        .expect("Cargo.toml must declare a rust-version");
    let parts: Vec<&str> = version.split('.').collect();
    assert_eq!(parts.len(), 3, "rust-version '{version}' must be MAJOR.MINOR.PATCH");
    assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
}

#[test]
fn every_demo_is_registered() {
    let manifest = manifest();
    let registered: Vec<String> = manifest
        .get("example")
        .and_then(Value::as_array)
        .expect("Cargo.toml must register the demos as [[example]] targets")
        .iter()
        .filter_map(|e| e.get("path").and_then(Value::as_str))
        .map(str::to_owned)
        .collect();

    for entry in std::fs::read_dir(project_root().join("demos")).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "rs") {
            let relative = format!("demos/{}", path.file_name().unwrap().to_string_lossy());
            assert!(
                registered.contains(&relative),
                "'{relative}' is not registered as an [[example]] in Cargo.toml"
            );
        }
    }
}
