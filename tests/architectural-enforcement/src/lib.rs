//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the detective core:
//! - No blocking sleeps in production code
//! - No blocking HTTP clients
//! - No blocking file I/O inside async functions
//!
//! The scanner below is line-based. It stops at the first `#[cfg(test)]` of a
//! file, since test modules sit at the bottom of every source file.

use std::fs;
use std::path::{Path, PathBuf};

/// One line of production code
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// File the line belongs to
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Code with any trailing `//` comment removed
    pub code: String,
    /// Whether the closest preceding `fn` is an `async fn`
    pub in_async_fn: bool,
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// Root of the detective core sources
#[must_use]
pub fn core_src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../detective/core/src")
}

/// Every production line of every `.rs` file under `dir`
#[must_use]
pub fn production_lines(dir: &Path) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        // Test-only helpers
        if path.file_name().and_then(|s| s.to_str()) == Some("test_utils.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(path) {
            lines.extend(scan(path, &content));
        }
    }
    lines
}

/// Split `content` into production lines
#[must_use]
pub fn scan(path: &Path, content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut in_async_fn = false;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }

        let code = line.split("//").next().unwrap_or(line);
        if code.contains("fn ") {
            in_async_fn = code.contains("async fn ");
        }

        lines.push(SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code: code.to_string(),
            in_async_fn,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stops_at_test_module() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() {} }\n";
        let lines = scan(Path::new("x.rs"), source);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 1);
    }

    #[test]
    fn test_scan_tracks_async_functions() {
        let source = "async fn a() {\n    x();\n}\nfn b() {\n    y();\n}\n";
        let lines = scan(Path::new("x.rs"), source);
        assert!(lines[1].in_async_fn);
        assert!(!lines[4].in_async_fn);
    }

    #[test]
    fn test_scan_drops_comments() {
        let source = "// std::thread::sleep\nlet a = 1; // reqwest::blocking\n";
        let lines = scan(Path::new("x.rs"), source);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].code.contains("reqwest"));
    }
}
