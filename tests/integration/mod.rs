//! Integration test suite for mcpman
//!
//! End-to-end tests driving the public API the way an embedding application
//! would: a [`mcpman::config::PreferenceStore`] and a
//! [`mcpman::mcp::McpStore`] wired together over real temp directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **location**: settings path resolution and CLI flavor switching
//! - **recovery**: corrupt file quarantine and lenient repair end to end
//! - **workflows**: full add/enable/list/remove registry lifecycles

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Route tracing output through the test writer, honoring `RUST_LOG` when
/// set. Only the first call installs the subscriber.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

mod location;
mod recovery;
mod workflows;
