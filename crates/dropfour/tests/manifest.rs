//! Dependency surface checks: the library crates stay runtime agnostic.

// =========================================================================
// Helpers
// =========================================================================

/// The `[dependencies]` table of a manifest, up to the next table header.
fn runtime_dependencies(manifest: &str) -> Vec<&str> {
    manifest
        .lines()
        .skip_while(|line| line.trim() != "[dependencies]")
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with('['))
        .filter_map(|line| line.split('=').next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with('#'))
        .collect()
}

// =========================================================================
// Runtime
// =========================================================================

#[test]
fn test_manifest_tokio_is_dev_only_in_dropfour() {
    let manifest = include_str!("../Cargo.toml");

    let deps = runtime_dependencies(manifest);

    assert!(deps.contains(&"dropfour-session"));
    assert!(!deps.contains(&"tokio"));
    assert!(manifest.contains("[dev-dependencies]\ntokio"));
}

#[test]
fn test_manifest_tokio_is_dev_only_in_dropfour_session() {
    let manifest = include_str!("../../dropfour-session/Cargo.toml");

    let deps = runtime_dependencies(manifest);

    assert!(deps.contains(&"dropfour-transport"));
    assert!(!deps.contains(&"tokio"));
    assert!(manifest.contains("[dev-dependencies]\ntokio"));
}
