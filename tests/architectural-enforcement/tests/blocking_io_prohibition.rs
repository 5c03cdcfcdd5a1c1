//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the detective core MUST NOT block the tokio
//! runtime. The controller, the capture provider and the analysis client all
//! run on it.
//!
//! **Required**: `tokio::time::sleep`, async `reqwest::Client`, and blocking
//! file reads only in non-async functions (config loading, opening a still
//! picture before the runtime does any work).

use architectural_enforcement::{core_src_dir, production_lines, SourceLine};

fn violations(predicate: impl Fn(&SourceLine) -> bool) -> Vec<SourceLine> {
    let dir = core_src_dir();
    assert!(dir.exists(), "core sources not found at {}", dir.display());
    production_lines(&dir)
        .into_iter()
        .filter(|line| predicate(line))
        .collect()
}

fn report(kind: &str, found: &[SourceLine]) {
    if found.is_empty() {
        return;
    }
    eprintln!("\n❌ {kind} found in production code:\n");
    for line in found {
        eprintln!("  ❌ {line}");
    }
    panic!("\nFound {} {kind} violation(s). Fix these before merging!", found.len());
}

/// Test that production code never sleeps the thread
#[test]
fn test_no_thread_sleep_in_production_code() {
    let found = violations(|line| {
        line.code.contains("std::thread::sleep") || line.code.contains("thread::sleep(")
    });
    report("Blocking sleep", &found);
}

/// Test that production code never uses the blocking HTTP client
#[test]
fn test_no_blocking_http_client() {
    let found = violations(|line| line.code.contains("reqwest::blocking"));
    report("Blocking HTTP client", &found);
}

/// Test that async functions never touch the file system synchronously
#[test]
fn test_no_blocking_file_io_in_async_functions() {
    let found = violations(|line| {
        line.in_async_fn
            && (line.code.contains("std::fs::")
                || line.code.contains("image::open(")
                || line.code.contains("File::open(")
                || line.code.contains("StillImageCamera::open("))
    });
    report("Blocking file I/O in async fn", &found);
}

/// Test that the kiosk entry point is covered by the async-fn check
#[test]
fn test_kiosk_main_is_scanned_as_async() {
    let lines = production_lines(&core_src_dir());
    let main: Vec<&SourceLine> = lines
        .iter()
        .filter(|l| l.path.ends_with("detective-kiosk.rs") && l.in_async_fn)
        .collect();
    assert!(main.iter().any(|l| l.code.contains("async fn main")));
    assert!(main.iter().any(|l| l.code.contains("spawn_blocking")));
}

/// Sanity check that the scanner actually sees the core
#[test]
fn test_scanner_sees_core_sources() {
    let lines = production_lines(&core_src_dir());
    assert!(lines
        .iter()
        .any(|l| l.path.ends_with("controller.rs") && l.code.contains("pub struct Controller")));
    assert!(lines.iter().any(|l| l.in_async_fn));
}
