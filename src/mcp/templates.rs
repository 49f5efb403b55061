//! Built-in MCP server templates.
//!
//! A template is a static blueprint for a registry entry: name, launcher
//! command, arguments, and a human-readable description. The catalog is
//! compiled in and immutable; installing a template copies its command and
//! args into the registry via the normal add path.

/// A static, built-in MCP server blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Registry name the installed entry will use
    pub name: &'static str,
    /// Launcher command, resolved against `PATH` during install
    pub command: &'static str,
    /// Arguments passed to the launcher
    pub args: &'static [&'static str],
    /// One-line description for display
    pub description: &'static str,
}

/// The built-in template catalog.
pub const TEMPLATES: &[Template] = &[
    Template {
        name: "context7",
        command: "npx",
        args: &["-y", "@upstash/context7-mcp"],
        description: "Context7 MCP for enhanced context management",
    },
    Template {
        name: "chrome-devtools",
        command: "npx",
        args: &["-y", "chrome-devtools-mcp@latest"],
        description: "Chrome DevTools MCP for browser automation",
    },
    Template {
        name: "excel",
        command: "uvx",
        args: &["excel-mcp-server", "stdio"],
        description: "Excel MCP for spreadsheet manipulation",
    },
];

/// Looks up a template by name.
#[must_use]
pub fn find_template(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.name == name)
}
