//! Settings path resolution driven by preference changes.

use mcpman::config::{CliType, PreferenceStore, PREFERENCE_FILE_NAME};
use mcpman::mcp::{McpStore, SETTINGS_FILE_NAME};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_cli_type_switch_moves_settings_location() {
    let prefs_dir = tempdir().unwrap();
    let base_dir = tempdir().unwrap();
    let mut prefs = PreferenceStore::with_path(prefs_dir.path().join(PREFERENCE_FILE_NAME));
    prefs.set_user_path(base_dir.path().to_str().unwrap()).unwrap();

    let mut store = McpStore::new(&mut prefs).unwrap();
    store.add_mcp("gemini-only", "npx", vec![]).unwrap();
    assert_eq!(
        store.settings_path(),
        base_dir.path().join(".gemini").join(SETTINGS_FILE_NAME)
    );

    prefs.set_cli_type(CliType::Qwen).unwrap();
    store.refresh_settings_path(&mut prefs, None, None).unwrap();
    assert_eq!(
        store.settings_path(),
        base_dir.path().join(".qwen").join(SETTINGS_FILE_NAME)
    );

    // The Qwen document is independent of the Gemini one and gets the Qwen
    // auth type on synthesis.
    let doc = store.load_settings().unwrap();
    assert_eq!(doc["security"]["auth"]["selectedType"], json!("qwen-oauth"));
    assert!(doc["mcpServers"].as_object().unwrap().is_empty());

    // The Gemini file was left untouched.
    let gemini: Value = serde_json::from_str(
        &fs::read_to_string(base_dir.path().join(".gemini").join(SETTINGS_FILE_NAME)).unwrap(),
    )
    .unwrap();
    assert!(gemini["mcpServers"].get("gemini-only").is_some());
}

#[test]
fn test_base_path_switch_moves_settings_location() {
    let prefs_dir = tempdir().unwrap();
    let first_base = tempdir().unwrap();
    let second_base = tempdir().unwrap();
    let mut prefs = PreferenceStore::with_path(prefs_dir.path().join(PREFERENCE_FILE_NAME));
    prefs.set_user_path(first_base.path().to_str().unwrap()).unwrap();

    let mut store = McpStore::new(&mut prefs).unwrap();
    store.add_mcp("srv", "npx", vec![]).unwrap();

    prefs.set_user_path(second_base.path().to_str().unwrap()).unwrap();
    store.refresh_settings_path(&mut prefs, None, None).unwrap();

    assert_eq!(
        store.settings_path(),
        second_base.path().join(".gemini").join(SETTINGS_FILE_NAME)
    );
    // Fresh location, fresh default document.
    assert!(store.get_mcps().unwrap().is_empty());
}

#[test]
fn test_base_override_beats_stored_user_path() {
    let prefs_dir = tempdir().unwrap();
    let stored_base = tempdir().unwrap();
    let override_base = tempdir().unwrap();
    let mut prefs = PreferenceStore::with_path(prefs_dir.path().join(PREFERENCE_FILE_NAME));
    prefs.set_user_path(stored_base.path().to_str().unwrap()).unwrap();

    let store =
        McpStore::from_base_path(&mut prefs, override_base.path().to_str().unwrap()).unwrap();
    assert_eq!(
        store.settings_path(),
        override_base.path().join(".gemini").join(SETTINGS_FILE_NAME)
    );
    // The override is per-store, not persisted.
    assert_eq!(
        prefs.get_user_path().unwrap(),
        stored_base.path().to_string_lossy().replace('\\', "/")
    );
}

#[test]
fn test_stale_user_path_falls_back_to_home() {
    let prefs_dir = tempdir().unwrap();
    let mut prefs = PreferenceStore::with_path(prefs_dir.path().join(PREFERENCE_FILE_NAME));

    let stale = tempdir().unwrap();
    prefs.set_user_path(stale.path().to_str().unwrap()).unwrap();
    drop(stale);

    // The stored path no longer exists, so resolution degrades to home.
    let store = McpStore::new(&mut prefs).unwrap();
    let home = dirs::home_dir().unwrap();
    assert_eq!(store.settings_path(), home.join(".gemini").join(SETTINGS_FILE_NAME));
}
