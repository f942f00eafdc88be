//! Claude Code Config Core Library
//!
//! Profile registry, settings reconciliation and MCP fan-out for Claude Code,
//! Gemini CLI and Codex. The `ccc` binary is a thin interactive layer on top.

pub mod claude;
pub mod codex;
pub mod config;
pub mod error;
pub mod gemini;
pub mod mcp;
pub mod presets;
pub mod registry;
pub mod store;
pub mod toml_lite;
pub mod version;

// Re-export commonly used types
pub use claude::{ClaudeSettings, ClearOutcome, PermissionMode};
pub use config::{AppType, ConfigPaths, Scope};
pub use error::{CoreError, Result};
pub use mcp::{ApplyOutcome, McpSelector, TargetStatus};
pub use presets::Preset;
pub use registry::{EnvKind, Environment, Registry, ServerDefinition};
pub use store::ConfigStore;
