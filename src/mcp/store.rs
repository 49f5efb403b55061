//! Settings file location, caching, load repair, and durable saves.
//!
//! The registry document physically lives inside the CLI tool's own
//! `settings.json`. This store reads and writes only the two sections it
//! understands (`mcp.allowed` and `mcpServers`) and round-trips everything
//! else unchanged.
//!
//! # Location Resolution
//!
//! `settings.json` is resolved as `<base>/.<cli_type>/settings.json`, where
//! `base` is, in priority order:
//!
//! 1. an explicit settings path given at construction (used verbatim),
//! 2. an explicit base-path override (validated for existence and write
//!    permission before acceptance),
//! 3. the preference store's stored user path,
//! 4. the process home directory.
//!
//! The store does not observe preference changes: after any base-path or
//! CLI-type mutation the owning application must call
//! [`McpStore::refresh_settings_path`], which recomputes the location and
//! unconditionally drops the in-memory cache.
//!
//! # Corrupt Files
//!
//! An unparseable settings file is never fatal: it is renamed aside to
//! `settings.json.corrupt.<timestamp>` (with a random suffix added on
//! collision, under a bounded attempt count) and a valid default document is
//! synthesized in its place. The original bytes stay on disk for
//! inspection.

use crate::config::{CliType, PreferenceStore};
use crate::core::McpmanError;
use crate::utils::fs::{check_write_permission, ensure_dir, write_json_file};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the CLI tool's settings document.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Bounded number of rename attempts when quarantining a corrupt file.
const QUARANTINE_ATTEMPTS: u32 = 5;

/// The raw settings document: a JSON object keyed by top-level section.
pub type SettingsDoc = Map<String, Value>;

/// CRUD and validation over the MCP registry section of the CLI tool's
/// settings file.
///
/// Each operation is a full load-mutate-save cycle; the in-memory cache is a
/// process-local read optimization, never a second source of truth. The
/// store is not internally synchronized, and concurrent external writers of
/// the same file race on the final atomic rename: last write wins.
#[derive(Debug)]
pub struct McpStore {
    settings_path: PathBuf,
    cli_type: CliType,
    cache: Option<SettingsDoc>,
}

impl McpStore {
    /// Creates a store resolving its location from the preference store,
    /// falling back to the process home directory when no user path is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error only if the home directory fallback cannot be
    /// determined.
    pub fn new(prefs: &mut PreferenceStore) -> Result<Self> {
        let (settings_path, cli_type) = resolve_settings_path(prefs, None)?;
        info!("Using settings path: {}", settings_path.display());
        Ok(Self { settings_path, cli_type, cache: None })
    }

    /// Creates a store targeting an explicit settings file.
    ///
    /// The CLI flavor used for default-document synthesis is inferred from
    /// the path's parent directory name (`.qwen` implies Qwen, anything
    /// else Gemini).
    pub fn from_settings_path(path: impl Into<PathBuf>) -> Self {
        let settings_path = path.into();
        let cli_type = CliType::infer_from_settings_path(&settings_path);
        info!("Using provided settings path: {}", settings_path.display());
        Self { settings_path, cli_type, cache: None }
    }

    /// Creates a store under an explicit base path, validated before
    /// acceptance.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::InvalidPath`] if the base is empty, exists but
    /// is not a directory, or has no existing ancestor;
    /// [`McpmanError::PermissionDenied`] if the write-permission check
    /// fails.
    pub fn from_base_path(prefs: &mut PreferenceStore, base: &str) -> Result<Self> {
        let (settings_path, cli_type) = resolve_settings_path(prefs, Some(base))?;
        info!("Using settings path from base override: {}", settings_path.display());
        Ok(Self { settings_path, cli_type, cache: None })
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// The CLI flavor used for default-document synthesis.
    #[must_use]
    pub fn cli_type(&self) -> CliType {
        self.cli_type
    }

    /// Recomputes the settings location and unconditionally clears the
    /// cache.
    ///
    /// Must be called after any change to the preference store's base path
    /// or CLI type; the store does not observe those changes itself.
    /// Priority: explicit `settings_path` override, then `base` override,
    /// then the preference store, then the home directory.
    ///
    /// # Errors
    ///
    /// Propagates base-override validation failures; on error the store
    /// keeps its previous location (the cache is still cleared).
    pub fn refresh_settings_path(
        &mut self,
        prefs: &mut PreferenceStore,
        settings_path: Option<PathBuf>,
        base: Option<&str>,
    ) -> Result<()> {
        self.cache = None;
        if let Some(path) = settings_path {
            self.cli_type = CliType::infer_from_settings_path(&path);
            info!("Refreshed settings path (explicit): {}", path.display());
            self.settings_path = path;
            return Ok(());
        }
        let (settings_path, cli_type) = resolve_settings_path(prefs, base)?;
        info!("Refreshed settings path: {}", settings_path.display());
        self.settings_path = settings_path;
        self.cli_type = cli_type;
        Ok(())
    }

    /// Loads the settings document.
    ///
    /// Serves from the cache when populated. An absent file yields a
    /// synthesized default document (cached but not yet written to disk); a
    /// present file is repaired leniently (see [`normalize_document`]); an
    /// unparseable file is quarantined and replaced by the default. The
    /// returned map is a deep copy; mutations are invisible until passed
    /// back through [`McpStore::save_settings`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if it parses to a
    /// non-object root, or if quarantining a corrupt file exhausts its
    /// attempts.
    pub fn load_settings(&mut self) -> Result<SettingsDoc> {
        if let Some(cache) = &self.cache {
            return Ok(cache.clone());
        }

        if !self.settings_path.exists() {
            info!("Settings file not found, creating default structure");
            let doc = default_document(self.cli_type);
            self.cache = Some(doc.clone());
            return Ok(doc);
        }

        let content = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings file: {}", self.settings_path.display()))?;

        let mut doc = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(doc)) => doc,
            Ok(_) => {
                return Err(McpmanError::invalid_settings(format!(
                    "settings root must be a JSON object: {}",
                    self.settings_path.display()
                ))
                .into());
            }
            Err(parse_err) => {
                self.quarantine_corrupt_file(&parse_err)?;
                default_document(self.cli_type)
            }
        };

        normalize_document(&mut doc);
        self.cache = Some(doc.clone());
        Ok(doc)
    }

    /// Validates and durably saves the settings document.
    ///
    /// Validation is a hard precondition: nothing is written when the
    /// document fails the structural checks. Non-string `args` elements are
    /// coerced to their string form as part of the write, maintaining the
    /// registry invariants. The write goes through a temp file in the
    /// target directory followed by an atomic rename, and on success the
    /// cache is replaced with the just-saved document.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::InvalidSettings`] on structural violations;
    /// propagates directory-creation and write failures.
    pub fn save_settings(&mut self, settings: &SettingsDoc) -> Result<()> {
        let mut doc = settings.clone();
        validate_for_save(&mut doc)?;

        let parent = self
            .settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        write_json_file(&self.settings_path, &Value::Object(doc.clone()))?;

        self.cache = Some(doc);
        info!("Settings saved to: {}", self.settings_path.display());
        Ok(())
    }

    /// Drops the in-memory cache, forcing the next load to hit the disk.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Renames the corrupt settings file aside, retrying with a random
    /// suffix on name collisions up to [`QUARANTINE_ATTEMPTS`] times.
    fn quarantine_corrupt_file(&self, parse_err: &serde_json::Error) -> Result<()> {
        let file_name = self
            .settings_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SETTINGS_FILE_NAME.to_string());
        let base_timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        for attempt in 0..QUARANTINE_ATTEMPTS {
            let suffix = if attempt == 0 {
                base_timestamp.clone()
            } else {
                let unique = uuid::Uuid::new_v4().simple().to_string();
                format!("{base_timestamp}_{}", &unique[..8])
            };
            let corrupt_path = self
                .settings_path
                .with_file_name(format!("{file_name}.corrupt.{suffix}"));

            if corrupt_path.exists() {
                debug!(
                    "Quarantine target already exists, retrying: {}",
                    corrupt_path.display()
                );
                continue;
            }

            match fs::rename(&self.settings_path, &corrupt_path) {
                Ok(()) => {
                    warn!(
                        "Corrupt settings file ({parse_err}) quarantined to: {}",
                        corrupt_path.display()
                    );
                    return Ok(());
                }
                Err(rename_err) => {
                    warn!(
                        "Quarantine attempt {}/{QUARANTINE_ATTEMPTS} failed: {rename_err}",
                        attempt + 1
                    );
                }
            }
        }

        Err(McpmanError::QuarantineFailed {
            path: self.settings_path.display().to_string(),
            attempts: QUARANTINE_ATTEMPTS,
        }
        .into())
    }
}

/// Resolves `<base>/.<cli_type>/settings.json` from the preference store,
/// an optional validated base override, or the home directory.
fn resolve_settings_path(
    prefs: &mut PreferenceStore,
    base_override: Option<&str>,
) -> Result<(PathBuf, CliType)> {
    let cli_type = prefs.get_cli_type();

    let base = if let Some(base) = base_override {
        validate_base_path(base)?
    } else if let Some(user_path) = prefs.get_user_path() {
        PathBuf::from(user_path)
    } else {
        let home = crate::utils::platform::get_home_dir()?;
        warn!("No user path configured, using home directory: {}", home.display());
        home
    };

    Ok((base.join(cli_type.dir_name()).join(SETTINGS_FILE_NAME), cli_type))
}

/// Validates a base-path override: it must be a directory (or have an
/// existing ancestor if it is to be created later) and pass a conservative
/// write-permission check.
fn validate_base_path(base: &str) -> Result<PathBuf> {
    if base.trim().is_empty() {
        return Err(McpmanError::invalid_path(base, "base path must not be empty").into());
    }

    let path = PathBuf::from(base);
    let permission_target: PathBuf;

    if path.exists() {
        if !path.is_dir() {
            return Err(McpmanError::invalid_path(base, "path is not a directory").into());
        }
        permission_target = path.clone();
    } else {
        warn!("Base path '{}' does not exist; it will be created on first save", path.display());
        let Some(ancestor) = path.ancestors().skip(1).find(|p| p.exists()) else {
            return Err(McpmanError::invalid_path(
                base,
                "no existing ancestor directory to validate permissions against",
            )
            .into());
        };
        permission_target = ancestor.to_path_buf();
    }

    if !check_write_permission(&permission_target, false) {
        return Err(McpmanError::PermissionDenied {
            path: permission_target.display().to_string(),
        }
        .into());
    }

    Ok(path)
}

/// Synthesizes the default settings document for a fresh installation.
pub(crate) fn default_document(cli_type: CliType) -> SettingsDoc {
    let Value::Object(doc) = json!({
        "ide": {"hasSeenNudge": true, "enabled": true},
        "mcp": {"allowed": []},
        "mcpServers": {},
        "security": {"auth": {"selectedType": cli_type.default_auth_type()}},
        "ui": {"theme": "Default"},
        "model": {"temperature": 0.7},
    }) else {
        unreachable!("default document literal is an object");
    };
    doc
}

/// Repairs the two understood sections in place, leaving everything else
/// untouched.
///
/// - `mcp` replaced with `{"allowed": []}` unless it is an object;
///   `mcp.allowed` replaced with `[]` unless it is an array.
/// - `mcpServers` replaced with `{}` unless it is an object; entries that
///   are not objects or lack a non-empty string `command` are dropped;
///   `args` is inserted as `[]` when missing or malformed and non-string
///   elements are coerced to their string form.
///
/// Dropping and coercion are deliberate leniency so a hand-edited file
/// degrades instead of failing closed; every repair is logged at `warn`.
pub(crate) fn normalize_document(doc: &mut SettingsDoc) {
    match doc.get_mut("mcp") {
        Some(Value::Object(mcp)) => {
            if !mcp.get("allowed").is_some_and(Value::is_array) {
                warn!("'mcp.allowed' is not a list, resetting to empty");
                mcp.insert("allowed".to_string(), json!([]));
            }
        }
        _ => {
            warn!("'mcp' section missing or malformed, resetting");
            doc.insert("mcp".to_string(), json!({"allowed": []}));
        }
    }

    match doc.get_mut("mcpServers") {
        Some(Value::Object(servers)) => {
            servers.retain(|name, cfg| {
                let Some(entry) = cfg.as_object_mut() else {
                    warn!("Dropping malformed MCP entry '{name}': not an object");
                    return false;
                };
                let command_ok = entry
                    .get("command")
                    .and_then(Value::as_str)
                    .is_some_and(|cmd| !cmd.is_empty());
                if !command_ok {
                    warn!("Dropping MCP entry '{name}': missing or empty command");
                    return false;
                }
                let args = coerce_args(entry.get("args"));
                entry.insert("args".to_string(), Value::Array(args));
                true
            });
        }
        _ => {
            warn!("'mcpServers' section missing or malformed, resetting");
            doc.insert("mcpServers".to_string(), json!({}));
        }
    }
}

/// Coerces an `args` value into an array of strings.
fn coerce_args(args: Option<&Value>) -> Vec<Value> {
    match args {
        Some(Value::Array(items)) => items.iter().map(|v| Value::String(coerce_arg(v))).collect(),
        _ => Vec::new(),
    }
}

/// The string form of one argument: strings pass through, everything else
/// serializes compactly.
pub(crate) fn coerce_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Structural validation run before every save. Mutates the document only
/// to coerce `args` elements to strings; every other violation rejects the
/// whole save.
fn validate_for_save(doc: &mut SettingsDoc) -> Result<()> {
    let Some(mcp) = doc.get("mcp") else {
        return Err(McpmanError::invalid_settings("missing required 'mcp' key").into());
    };
    let Some(mcp) = mcp.as_object() else {
        return Err(McpmanError::invalid_settings("'mcp' must be an object").into());
    };
    if !mcp.get("allowed").is_some_and(Value::is_array) {
        return Err(McpmanError::invalid_settings("'mcp.allowed' must be a list").into());
    }

    let Some(servers) = doc.get_mut("mcpServers") else {
        return Err(McpmanError::invalid_settings("missing required 'mcpServers' key").into());
    };
    let Some(servers) = servers.as_object_mut() else {
        return Err(McpmanError::invalid_settings("'mcpServers' must be an object").into());
    };

    for (name, cfg) in servers.iter_mut() {
        let Some(entry) = cfg.as_object_mut() else {
            return Err(McpmanError::invalid_settings(format!(
                "MCP '{name}' configuration must be an object"
            ))
            .into());
        };
        let command_ok = entry
            .get("command")
            .and_then(Value::as_str)
            .is_some_and(|cmd| !cmd.is_empty());
        if !command_ok {
            return Err(McpmanError::invalid_settings(format!(
                "MCP '{name}' must have a non-empty 'command' string"
            ))
            .into());
        }
        match entry.get("args") {
            Some(Value::Array(items)) => {
                let coerced: Vec<Value> =
                    items.iter().map(|v| Value::String(coerce_arg(v))).collect();
                entry.insert("args".to_string(), Value::Array(coerced));
            }
            _ => {
                return Err(McpmanError::invalid_settings(format!(
                    "MCP '{name}' 'args' must be a list"
                ))
                .into());
            }
        }
    }

    Ok(())
}
