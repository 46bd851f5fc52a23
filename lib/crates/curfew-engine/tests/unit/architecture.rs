//! Structural tests for layer boundaries.
//!
//! `domain` stays pure and `application` talks to the outside world only
//! through its ports.

use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Non-comment lines outside `#[cfg(test)]` modules.
fn production_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .take_while(|l| !l.trim_start().starts_with("#[cfg(test)]"))
        .filter(|l| !l.trim_start().starts_with("//"))
        .map(String::from)
        .collect()
}

fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer);
    let mut found = Vec::new();
    for file in collect_rs_files(&root) {
        for line in production_lines(&file) {
            if let Some(pattern) = forbidden.iter().find(|p| line.contains(*p)) {
                found.push(format!("{}: uses {pattern}", file.display()));
            }
        }
    }
    found
}

#[test]
fn test_domain_layer_has_no_io() {
    let found = violations(
        "domain",
        &["crate::infra", "crate::application", "tokio", "std::fs", "std::process"],
    );
    assert!(found.is_empty(), "domain layer violations:\n{}", found.join("\n"));
}

#[test]
fn test_application_layer_does_not_reach_into_infra() {
    let found = violations("application", &["crate::infra", "std::fs", "std::process::Command"]);
    assert!(found.is_empty(), "application layer violations:\n{}", found.join("\n"));
}
