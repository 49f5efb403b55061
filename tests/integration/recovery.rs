//! Corrupt settings recovery exercised through the public API.

use mcpman::mcp::{McpStore, SETTINGS_FILE_NAME};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

use super::init_test_logging;

#[test]
fn test_quarantine_then_continue_working() {
    init_test_logging();
    let temp = tempdir().unwrap();
    let settings_dir = temp.path().join(".gemini");
    fs::create_dir_all(&settings_dir).unwrap();
    let settings_path = settings_dir.join(SETTINGS_FILE_NAME);
    fs::write(&settings_path, "this is not json {{{").unwrap();

    let mut store = McpStore::from_settings_path(&settings_path);

    // First touch quarantines the garbage and synthesizes a default.
    store.add_mcp("srv", "npx", vec![]).unwrap();

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(on_disk["mcpServers"]["srv"]["command"], json!("npx"));
    assert_eq!(on_disk["security"]["auth"]["selectedType"], json!("oauth-personal"));

    let quarantined: Vec<_> = fs::read_dir(&settings_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupt."))
        .collect();
    assert_eq!(quarantined.len(), 1);
    assert_eq!(fs::read_to_string(quarantined[0].path()).unwrap(), "this is not json {{{");
}

#[test]
fn test_hand_edited_file_degrades_without_losing_good_entries() {
    init_test_logging();
    let temp = tempdir().unwrap();
    let settings_dir = temp.path().join(".gemini");
    fs::create_dir_all(&settings_dir).unwrap();
    let settings_path = settings_dir.join(SETTINGS_FILE_NAME);
    fs::write(
        &settings_path,
        serde_json::to_string_pretty(&json!({
            "mcp": {"allowed": ["good", "broken"]},
            "mcpServers": {
                "good": {"command": "npx", "args": [1, "two"]},
                "broken": {"args": ["orphaned"]}
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let mut store = McpStore::from_settings_path(&settings_path);
    let mcps = store.get_mcps().unwrap();

    // The malformed entry is gone, the valid one survives with coerced args.
    assert_eq!(mcps.len(), 1);
    assert_eq!(mcps["good"].args, vec!["1".to_string(), "two".to_string()]);
    assert!(mcps["good"].enabled);

    // Saving afterwards persists the repaired document.
    store.toggle_allowed("good", Some(true)).unwrap();
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert!(on_disk["mcpServers"].get("broken").is_none());
    assert_eq!(on_disk["mcpServers"]["good"]["args"], json!(["1", "two"]));
}
