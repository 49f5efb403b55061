//! Typed views over the registry section of the settings document.
//!
//! The settings file itself is foreign-owned JSON and is handled as a raw
//! [`serde_json::Map`] so unrelated sections round-trip untouched; these
//! structs are the typed read/write models the CRUD operations exchange
//! with callers.

use serde::{Deserialize, Serialize};

/// A single MCP server entry as stored under `mcpServers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// The command to execute to start the server. Always non-empty.
    pub command: String,

    /// Arguments to pass to the command. Elements are always strings.
    #[serde(default)]
    pub args: Vec<String>,
}

/// An MCP server together with its allow-list membership, as returned by
/// [`McpStore::get_mcps`](crate::mcp::McpStore::get_mcps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpStatus {
    /// The command to execute to start the server
    pub command: String,

    /// Arguments to pass to the command
    #[serde(default)]
    pub args: Vec<String>,

    /// Whether the server name is currently on the allow-list
    pub enabled: bool,
}

/// Detailed view of a single named server, as returned by
/// [`McpStore::get_mcp_details`](crate::mcp::McpStore::get_mcp_details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpDetails {
    /// The registry key of the server
    pub name: String,

    /// The command to execute to start the server
    pub command: String,

    /// Arguments to pass to the command
    #[serde(default)]
    pub args: Vec<String>,

    /// Whether the server name is currently on the allow-list
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_spec_args_default() {
        let spec: ServerSpec = serde_json::from_str(r#"{"command": "npx"}"#).unwrap();
        assert_eq!(spec.command, "npx");
        assert!(spec.args.is_empty());
    }

    #[test]
    fn test_status_serialization_shape() {
        let status = McpStatus {
            command: "echo".to_string(),
            args: vec!["hi".to_string()],
            enabled: false,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"command": "echo", "args": ["hi"], "enabled": false})
        );
    }
}
