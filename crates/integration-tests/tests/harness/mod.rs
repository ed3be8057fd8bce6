#![allow(dead_code)]

pub mod services;
pub mod server;

use std::sync::Once;

/// Install a test-writer subscriber once per test binary
///
/// Honors `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_test_writer().with_target(true);
        tracing_subscriber::registry().with(filter).with(fmt_layer).try_init().ok();
    });
}
