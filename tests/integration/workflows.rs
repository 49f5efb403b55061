//! Full registry lifecycles over real temp directories.

use mcpman::config::{PreferenceStore, PREFERENCE_FILE_NAME};
use mcpman::mcp::{McpStore, SETTINGS_FILE_NAME};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn wired_stores() -> (tempfile::TempDir, tempfile::TempDir, PreferenceStore, McpStore) {
    let prefs_dir = tempdir().unwrap();
    let base_dir = tempdir().unwrap();
    let mut prefs = PreferenceStore::with_path(prefs_dir.path().join(PREFERENCE_FILE_NAME));
    prefs.set_user_path(base_dir.path().to_str().unwrap()).unwrap();
    let store = McpStore::new(&mut prefs).unwrap();
    (prefs_dir, base_dir, prefs, store)
}

#[test]
fn test_add_enable_list_remove_lifecycle() {
    let (_prefs_dir, base_dir, _prefs, mut store) = wired_stores();

    store
        .add_mcp("context7", "npx", vec!["-y".into(), "@upstash/context7-mcp".into()])
        .unwrap();
    store.add_mcp("excel", "uvx", vec!["excel-mcp-server".into(), "stdio".into()]).unwrap();
    store.toggle_allowed("context7", Some(true)).unwrap();

    let mcps = store.get_mcps().unwrap();
    assert_eq!(mcps.len(), 2);
    assert!(mcps["context7"].enabled);
    assert!(!mcps["excel"].enabled);

    // The document landed where the preference base says it should.
    let settings_path = base_dir.path().join(".gemini").join(SETTINGS_FILE_NAME);
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(on_disk["mcp"]["allowed"], json!(["context7"]));

    store.remove_mcp("context7").unwrap();
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(on_disk["mcp"]["allowed"], json!([]));
    assert!(on_disk["mcpServers"].get("context7").is_none());
    assert!(on_disk["mcpServers"].get("excel").is_some());
}

#[test]
fn test_fresh_store_sees_previous_writes() {
    let (_prefs_dir, _base_dir, mut prefs, mut store) = wired_stores();

    store.add_mcp("srv", "npx", vec![]).unwrap();
    store.toggle_allowed("srv", Some(true)).unwrap();

    // A second store built from the same preferences reads the same file.
    let mut second = McpStore::new(&mut prefs).unwrap();
    let mcps = second.get_mcps().unwrap();
    assert!(mcps["srv"].enabled);
}

#[test]
fn test_template_install_end_to_end() {
    let (_prefs_dir, base_dir, _prefs, mut store) = wired_stores();

    store.install_from_template("chrome-devtools", true, true).unwrap();
    assert!(store.is_template_installed("chrome-devtools").unwrap());

    let settings_path = base_dir.path().join(".gemini").join(SETTINGS_FILE_NAME);
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(on_disk["mcpServers"]["chrome-devtools"]["command"], json!("npx"));
    assert_eq!(
        on_disk["mcpServers"]["chrome-devtools"]["args"],
        json!(["-y", "chrome-devtools-mcp@latest"])
    );
    assert_eq!(on_disk["mcp"]["allowed"], json!(["chrome-devtools"]));
}

#[test]
fn test_foreign_settings_survive_registry_edits() {
    let (_prefs_dir, base_dir, _prefs, mut store) = wired_stores();

    // Simulate the CLI tool owning the file first.
    let settings_dir = base_dir.path().join(".gemini");
    fs::create_dir_all(&settings_dir).unwrap();
    let settings_path = settings_dir.join(SETTINGS_FILE_NAME);
    fs::write(
        &settings_path,
        serde_json::to_string_pretty(&json!({
            "ui": {"theme": "Dracula"},
            "telemetry": {"enabled": false},
            "mcp": {"allowed": []},
            "mcpServers": {}
        }))
        .unwrap(),
    )
    .unwrap();

    store.add_mcp("srv", "npx", vec![]).unwrap();

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(on_disk["ui"]["theme"], json!("Dracula"));
    assert_eq!(on_disk["telemetry"]["enabled"], json!(false));
    assert_eq!(on_disk["mcpServers"]["srv"]["command"], json!("npx"));
}

#[test]
fn test_batch_allow_list_update() {
    let (_prefs_dir, _base_dir, _prefs, mut store) = wired_stores();

    for name in ["a", "b", "c", "d"] {
        store.add_mcp(name, "npx", vec![]).unwrap();
    }
    store.set_allowed_many(&["a".into(), "b".into(), "c".into()], &[]).unwrap();
    store.set_allowed_many(&["d".into()], &["a".into(), "c".into()]).unwrap();

    let mcps = store.get_mcps().unwrap();
    let enabled: Vec<_> =
        ["a", "b", "c", "d"].iter().filter(|n| mcps[**n].enabled).copied().collect();
    assert_eq!(enabled, vec!["b", "d"]);
}
