//! User preference configuration.
//!
//! See [`preference`] for the preference document store and the
//! [`CliType`] flavor selector consumed by the MCP registry store.

pub mod preference;

pub use preference::{CliType, PreferenceStore, UserPreference, PREFERENCE_FILE_NAME};
