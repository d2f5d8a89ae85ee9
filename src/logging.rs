//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; binaries and tests choose how
//! to print them.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `fmt` subscriber.
///
/// # Environment
/// - `RUST_LOG`: filter directives (default `info`), e.g.
///   `RUST_LOG=u_timetable::compiler=debug`
///
/// Panics if a global subscriber is already installed.
///
/// # Example
/// ```no_run
/// u_timetable::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Installs a `debug` subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
