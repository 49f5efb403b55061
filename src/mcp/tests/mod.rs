use crate::mcp::store::McpStore;
use std::path::Path;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Test helper: route tracing output through the test writer, honoring
/// `RUST_LOG` when set. Safe to call from every test; only the first call
/// installs the subscriber.
pub(crate) fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Test helper: store targeting `<dir>/.gemini/settings.json`.
pub(crate) fn gemini_store(dir: &Path) -> McpStore {
    init_test_logging();
    McpStore::from_settings_path(dir.join(".gemini").join("settings.json"))
}
