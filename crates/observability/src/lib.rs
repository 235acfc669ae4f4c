//! Tracing/logging setup shared by binaries, tests and benches.

/// Initialize process-wide tracing with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Json);
}

/// Initialize process-wide tracing with human-readable output, for test runs.
///
/// Uses the test writer so output is captured per test. Safe to call from
/// every test.
pub fn init_for_tests() {
    tracing::init(tracing::LogFormat::Test);
}

/// Tracing configuration (filters, formats).
pub mod tracing;
