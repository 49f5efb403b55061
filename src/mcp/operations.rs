//! Registry CRUD, allow-list toggling, and template installation.
//!
//! Every operation here is a full load, mutate-in-memory, save cycle, so
//! each call is an independently durable, atomic unit; there is no
//! transaction spanning two operations. The one deliberate exception to
//! one-change-one-write is [`McpStore::set_allowed_many`], which batches an
//! arbitrary number of allow-list changes into a single save.

use crate::core::McpmanError;
use crate::mcp::models::{McpDetails, McpStatus, ServerSpec};
use crate::mcp::store::{coerce_arg, McpStore, SettingsDoc};
use crate::mcp::templates::{find_template, Template, TEMPLATES};
use crate::utils::platform::command_exists;
use anyhow::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::info;

impl McpStore {
    /// Returns all MCP servers with their configuration and enabled status.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn get_mcps(&mut self) -> Result<HashMap<String, McpStatus>> {
        let settings = self.load_settings()?;
        let allowed = allowed_names(&settings);

        let mut result = HashMap::new();
        if let Some(Value::Object(servers)) = settings.get("mcpServers") {
            for (name, cfg) in servers {
                result.insert(
                    name.clone(),
                    McpStatus {
                        command: entry_command(cfg),
                        args: entry_args(cfg),
                        enabled: allowed.contains(&name.as_str()),
                    },
                );
            }
        }
        Ok(result)
    }

    /// Returns details of a single named server, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn get_mcp_details(&mut self, name: &str) -> Result<Option<McpDetails>> {
        let settings = self.load_settings()?;
        let Some(cfg) = settings.get("mcpServers").and_then(|s| s.get(name)) else {
            return Ok(None);
        };
        let enabled = allowed_names(&settings).contains(&name);
        Ok(Some(McpDetails {
            name: name.to_string(),
            command: entry_command(cfg),
            args: entry_args(cfg),
            enabled,
        }))
    }

    /// Adds a new MCP server to the registry.
    ///
    /// New entries start disabled; use [`McpStore::toggle_allowed`] to
    /// enable them.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::McpAlreadyExists`] on a duplicate name and
    /// [`McpmanError::InvalidSettings`] on an empty name or command;
    /// propagates load/save failures.
    pub fn add_mcp(&mut self, name: &str, command: &str, args: Vec<String>) -> Result<()> {
        if name.is_empty() {
            return Err(McpmanError::invalid_settings("MCP name must be a non-empty string").into());
        }
        if command.is_empty() {
            return Err(
                McpmanError::invalid_settings("MCP command must be a non-empty string").into()
            );
        }

        let mut settings = self.load_settings()?;
        if server_exists(&settings, name) {
            return Err(McpmanError::McpAlreadyExists { name: name.to_string() }.into());
        }

        let spec = ServerSpec { command: command.to_string(), args };
        servers_mut(&mut settings).insert(name.to_string(), serde_json::to_value(&spec)?);

        self.save_settings(&settings)?;
        info!("Added MCP '{name}'");
        Ok(())
    }

    /// Removes an MCP server from the registry, and from the allow-list if
    /// it was enabled, so every allow-list name still references a live
    /// registry entry after this returns.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::McpNotFound`] if absent; propagates load/save
    /// failures.
    pub fn remove_mcp(&mut self, name: &str) -> Result<()> {
        let mut settings = self.load_settings()?;
        if !server_exists(&settings, name) {
            return Err(McpmanError::McpNotFound { name: name.to_string() }.into());
        }

        servers_mut(&mut settings).remove(name);
        allowed_mut(&mut settings).retain(|v| v.as_str() != Some(name));

        self.save_settings(&settings)?;
        info!("Removed MCP '{name}'");
        Ok(())
    }

    /// Updates an existing server's command and/or args; `None` keeps the
    /// current value.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::McpNotFound`] if absent and
    /// [`McpmanError::InvalidSettings`] on an empty command; propagates
    /// load/save failures.
    pub fn update_mcp(
        &mut self,
        name: &str,
        command: Option<&str>,
        args: Option<Vec<String>>,
    ) -> Result<()> {
        if let Some(cmd) = command
            && cmd.is_empty()
        {
            return Err(
                McpmanError::invalid_settings("MCP command must be a non-empty string").into()
            );
        }

        let mut settings = self.load_settings()?;
        if !server_exists(&settings, name) {
            return Err(McpmanError::McpNotFound { name: name.to_string() }.into());
        }

        if let Some(Value::Object(entry)) = servers_mut(&mut settings).get_mut(name) {
            if let Some(cmd) = command {
                entry.insert("command".to_string(), json!(cmd));
            }
            if let Some(args) = args {
                entry.insert("args".to_string(), json!(args));
            }
        }

        self.save_settings(&settings)?;
        info!("Updated MCP '{name}'");
        Ok(())
    }

    /// Toggles or sets a server's allow-list membership, returning the new
    /// enabled state.
    ///
    /// With `enabled = None` the current membership is flipped; otherwise
    /// membership is set to match exactly, making repeated calls with the
    /// same value idempotent (the document is still re-saved).
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::McpNotFound`] if absent; propagates load/save
    /// failures.
    pub fn toggle_allowed(&mut self, name: &str, enabled: Option<bool>) -> Result<bool> {
        let mut settings = self.load_settings()?;
        if !server_exists(&settings, name) {
            return Err(McpmanError::McpNotFound { name: name.to_string() }.into());
        }

        let allowed = allowed_mut(&mut settings);
        let current = allowed.iter().any(|v| v.as_str() == Some(name));
        let new_state = enabled.unwrap_or(!current);

        if new_state && !current {
            allowed.push(json!(name));
        } else if !new_state && current {
            allowed.retain(|v| v.as_str() != Some(name));
        }

        self.save_settings(&settings)?;
        info!("Set MCP '{name}' enabled state to: {new_state}");
        Ok(new_state)
    }

    /// Applies a batch of allow-list changes with exactly one disk write.
    ///
    /// Every named server is validated against the registry first; if any
    /// name is unknown the call fails without mutating anything. Names in
    /// `to_enable` win over duplicates in `to_disable`.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::McpNotFound`] naming the unknown entries;
    /// propagates load/save failures.
    pub fn set_allowed_many(&mut self, to_enable: &[String], to_disable: &[String]) -> Result<()> {
        let mut settings = self.load_settings()?;

        let missing: Vec<&str> = to_enable
            .iter()
            .chain(to_disable.iter())
            .filter(|name| !server_exists(&settings, name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(McpmanError::McpNotFound { name: missing.join(", ") }.into());
        }

        let allowed = allowed_mut(&mut settings);
        for name in to_disable {
            allowed.retain(|v| v.as_str() != Some(name.as_str()));
        }
        for name in to_enable {
            if !allowed.iter().any(|v| v.as_str() == Some(name.as_str())) {
                allowed.push(json!(name));
            }
        }

        self.save_settings(&settings)?;
        info!("Applied batch allow-list change: +{} -{}", to_enable.len(), to_disable.len());
        Ok(())
    }

    /// The built-in template catalog.
    #[must_use]
    pub fn get_templates(&self) -> &'static [Template] {
        TEMPLATES
    }

    /// Whether the MCP created by a template is already in the registry.
    ///
    /// Unknown template names return `false`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn is_template_installed(&mut self, template_name: &str) -> Result<bool> {
        let Some(template) = find_template(template_name) else {
            return Ok(false);
        };
        let settings = self.load_settings()?;
        Ok(server_exists(&settings, template.name))
    }

    /// Installs an MCP server from the built-in template catalog.
    ///
    /// Unless `skip_dependency_check` is set, the template's launcher
    /// command must resolve on the current `PATH`. On success the entry is
    /// added and, when `enable` is set, turned on in the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::TemplateNotFound`] for an unknown template,
    /// [`McpmanError::McpAlreadyExists`] when the entry already exists, and
    /// [`McpmanError::MissingDependency`] when the launcher is not on
    /// `PATH`; propagates load/save failures.
    pub fn install_from_template(
        &mut self,
        template_name: &str,
        enable: bool,
        skip_dependency_check: bool,
    ) -> Result<()> {
        let Some(template) = find_template(template_name) else {
            return Err(McpmanError::TemplateNotFound { name: template_name.to_string() }.into());
        };

        let settings = self.load_settings()?;
        if server_exists(&settings, template.name) {
            return Err(McpmanError::McpAlreadyExists { name: template.name.to_string() }.into());
        }

        if !skip_dependency_check && !command_exists(template.command) {
            return Err(McpmanError::MissingDependency {
                template: template.name.to_string(),
                command: template.command.to_string(),
            }
            .into());
        }

        let args = template.args.iter().map(|a| (*a).to_string()).collect();
        self.add_mcp(template.name, template.command, args)?;
        if enable {
            self.toggle_allowed(template.name, Some(true))?;
        }

        info!("Installed MCP '{template_name}' from template");
        Ok(())
    }
}

fn server_exists(settings: &SettingsDoc, name: &str) -> bool {
    settings
        .get("mcpServers")
        .and_then(Value::as_object)
        .is_some_and(|servers| servers.contains_key(name))
}

fn allowed_names(settings: &SettingsDoc) -> Vec<&str> {
    settings
        .get("mcp")
        .and_then(|mcp| mcp.get("allowed"))
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// The `mcpServers` object, inserting an empty one if the section is
/// missing (load repair normally guarantees it exists).
fn servers_mut(settings: &mut SettingsDoc) -> &mut Map<String, Value> {
    if !settings.get("mcpServers").is_some_and(Value::is_object) {
        settings.insert("mcpServers".to_string(), json!({}));
    }
    settings
        .get_mut("mcpServers")
        .and_then(Value::as_object_mut)
        .expect("mcpServers was just ensured to be an object")
}

/// The `mcp.allowed` array, inserting an empty one if the section is
/// missing.
fn allowed_mut(settings: &mut SettingsDoc) -> &mut Vec<Value> {
    if !settings.get("mcp").is_some_and(Value::is_object) {
        settings.insert("mcp".to_string(), json!({"allowed": []}));
    }
    let mcp = settings
        .get_mut("mcp")
        .and_then(Value::as_object_mut)
        .expect("mcp was just ensured to be an object");
    if !mcp.get("allowed").is_some_and(Value::is_array) {
        mcp.insert("allowed".to_string(), json!([]));
    }
    mcp.get_mut("allowed")
        .and_then(Value::as_array_mut)
        .expect("mcp.allowed was just ensured to be an array")
}

fn entry_command(cfg: &Value) -> String {
    cfg.get("command").and_then(Value::as_str).unwrap_or_default().to_string()
}

fn entry_args(cfg: &Value) -> Vec<String> {
    cfg.get("args")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(coerce_arg).collect())
        .unwrap_or_default()
}
