//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that the domain stays pure and
//! the application layer reaches infrastructure only through its ports.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
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

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(") && trimmed.contains("test") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment, non-test lines of `path` that contain any of `forbidden`.
fn violations(path: &Path, forbidden: &[&str]) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    let mut found = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let in_test = tracker.process_line(line);
        let trimmed = line.trim();
        if in_test || trimmed.starts_with("//") || trimmed.starts_with("#[cfg(") {
            continue;
        }
        if let Some(pattern) = forbidden.iter().find(|p| line.contains(*p)) {
            found.push(format!("{}:{}: uses {pattern}", path.display(), number + 1));
        }
    }
    found
}

fn src(dir: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(dir)
}

#[test]
fn test_domain_has_no_io_or_outer_layer_imports() {
    let files = collect_rs_files(&src("domain"));
    assert!(!files.is_empty(), "domain sources not found");
    let found: Vec<String> = files
        .iter()
        .flat_map(|f| {
            violations(
                f,
                &["tokio", "std::process", "std::fs", "crate::application", "crate::infra"],
            )
        })
        .collect();
    assert!(found.is_empty(), "domain boundary violations:\n{}", found.join("\n"));
}

#[test]
fn test_application_does_not_import_infra() {
    let files = collect_rs_files(&src("application"));
    assert!(!files.is_empty(), "application sources not found");
    let found: Vec<String> = files
        .iter()
        .flat_map(|f| violations(f, &["crate::infra", "std::fs", "tokio::process"]))
        .collect();
    assert!(found.is_empty(), "application boundary violations:\n{}", found.join("\n"));
}
