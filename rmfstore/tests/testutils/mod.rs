//! Test utilities for rmfstore integration tests
//!
//! `StoreFixture` creates an isolated file for each backend flavour so
//! the same test body can run against all of them.

#![allow(dead_code)]

pub mod store_fixture;

/// Route library logs to the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
