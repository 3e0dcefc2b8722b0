//! Tests for tracing initialization.

use std::sync::Mutex;

use rewind_core::tracing::init_tracing;

/// Serializes tests that touch `REWIND_LOG`.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_per_module_filter_accepted() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("REWIND_LOG", "rewind_engine=debug,rewind_storage=warn");
    init_tracing();
    std::env::remove_var("REWIND_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    tracing::info!(target: "rewind", "still alive");
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("REWIND_LOG", "=====");
    init_tracing();
    std::env::remove_var("REWIND_LOG");
}
