//! Cross-layer integration tests for Shardhold
//!
//! Tests that drive the registry, worlds and lifecycle cache together the way
//! a server loop would.


/// Routes `tracing` output through the test harness. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
