//! MCP server selection and fan-out
//!
//! The active subset of the registry's servers is written to three
//! independent documents: `~/.claude.json`, `~/.gemini/settings.json` and
//! `~/.codex/config.toml`. Each write is its own read-modify-write step; a
//! failure in one never stops the others.

use crate::codex::{self, RMCP_CLIENT_KEY};
use crate::config::{read_json_file, write_json_file, AppType, ConfigPaths};
use crate::error::{CoreError, Result};
use crate::registry::{Registry, ServerDefinition, ServerSpec};
use crate::toml_lite::MCP_SERVERS_KEY;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key holding servers in the Claude and Gemini JSON documents
pub const JSON_SERVERS_KEY: &str = "mcpServers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Written { servers: usize },
    Cleared,
    /// Nothing to clear; the file was not touched
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStatus {
    pub target: AppType,
    pub path: PathBuf,
    pub outcome: ApplyOutcome,
}

impl TargetStatus {
    pub fn is_ok(&self) -> bool {
        !matches!(self.outcome, ApplyOutcome::Failed(_))
    }
}

/// Servers currently present in one target document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetServers {
    pub target: AppType,
    pub path: PathBuf,
    pub exists: bool,
    pub servers: Vec<String>,
    pub error: Option<String>,
}

/// Codex-shaped server tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodexServers {
    pub servers: Map<String, Value>,
    pub needs_rmcp_client: bool,
}

/// `mcpServers` restricted to the active names, in selection order.
///
/// Names that no longer exist are dropped.
pub fn active_server_configs(registry: &Registry) -> IndexMap<String, ServerDefinition> {
    registry
        .active_mcp_servers
        .iter()
        .filter_map(|name| {
            registry
                .mcp_servers
                .get(name)
                .map(|def| (name.clone(), def.clone()))
        })
        .collect()
}

/// Translate server definitions into Codex's table shape
pub fn to_codex_servers(active: &IndexMap<String, ServerDefinition>) -> CodexServers {
    let mut out = CodexServers::default();

    for (name, def) in active {
        let mut table = Map::new();
        match def.spec(name) {
            Ok(ServerSpec::Stdio { command, args, env }) => {
                table.insert("command".into(), Value::from(command));
                table.insert("args".into(), Value::from(args));
                if !env.is_empty() {
                    let env: Map<String, Value> =
                        env.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                    table.insert("env".into(), Value::Object(env));
                }
            }
            Ok(ServerSpec::Http {
                url,
                bearer_token,
                oauth,
            }) => {
                if let Some(url) = url {
                    table.insert("url".into(), Value::from(url));
                }
                if let Some(token) = bearer_token {
                    table.insert("bearer_token".into(), Value::from(token));
                }
                out.needs_rmcp_client |= oauth;
            }
            Err(e) => {
                log::warn!("Skipping server for Codex: {e}");
                continue;
            }
        }
        out.servers.insert(name.clone(), Value::Object(table));
    }

    out
}

pub struct McpSelector {
    claude_path: PathBuf,
    gemini_path: PathBuf,
    codex_path: PathBuf,
}

impl McpSelector {
    pub fn new(paths: &ConfigPaths) -> Self {
        Self {
            claude_path: paths.claude_mcp_path(),
            gemini_path: paths.gemini_settings_path(),
            codex_path: paths.codex_config_path(),
        }
    }

    /// Write the active selection to every target, one status per target
    pub fn apply_active(&self, registry: &Registry) -> Vec<TargetStatus> {
        let active = active_server_configs(registry);

        let (json_servers, codex_servers) = if active.is_empty() {
            (None, None)
        } else {
            let json: Map<String, Value> = active
                .iter()
                .map(|(name, def)| (name.clone(), def.to_value()))
                .collect();
            (Some(json), Some(to_codex_servers(&active)))
        };

        vec![
            run_step(AppType::Claude, &self.claude_path, |path| {
                apply_json(path, json_servers.as_ref())
            }),
            run_step(AppType::Gemini, &self.gemini_path, |path| {
                apply_json(path, json_servers.as_ref())
            }),
            run_step(AppType::Codex, &self.codex_path, |path| {
                apply_codex(path, codex_servers.as_ref())
            }),
        ]
    }

    pub fn status(&self) -> Vec<TargetServers> {
        vec![
            json_target_servers(AppType::Claude, &self.claude_path),
            json_target_servers(AppType::Gemini, &self.gemini_path),
            codex_target_servers(&self.codex_path),
        ]
    }
}

/// Server names currently present in each target document
pub fn mcp_status(paths: &ConfigPaths) -> Vec<TargetServers> {
    McpSelector::new(paths).status()
}

fn run_step(
    target: AppType,
    path: &Path,
    step: impl FnOnce(&Path) -> Result<ApplyOutcome>,
) -> TargetStatus {
    let outcome = step(path).unwrap_or_else(|e| {
        log::error!("Failed to apply MCP servers to {target}: {e}");
        ApplyOutcome::Failed(e.to_string())
    });
    TargetStatus {
        target,
        path: path.to_path_buf(),
        outcome,
    }
}

fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    match read_json_file(path)? {
        Some(Value::Object(doc)) => Ok(doc),
        Some(_) => Err(CoreError::Config(format!(
            "{}: root must be a JSON object",
            path.display()
        ))),
        None => Ok(Map::new()),
    }
}

fn apply_json(path: &Path, servers: Option<&Map<String, Value>>) -> Result<ApplyOutcome> {
    let mut doc = read_json_object(path)?;

    let outcome = match servers {
        None => {
            if doc.shift_remove(JSON_SERVERS_KEY).is_none() {
                return Ok(ApplyOutcome::Unchanged);
            }
            ApplyOutcome::Cleared
        }
        Some(servers) => {
            doc.insert(JSON_SERVERS_KEY.into(), Value::Object(servers.clone()));
            ApplyOutcome::Written {
                servers: servers.len(),
            }
        }
    };

    write_json_file(path, &Value::Object(doc))?;
    Ok(outcome)
}

fn apply_codex(path: &Path, servers: Option<&CodexServers>) -> Result<ApplyOutcome> {
    let mut doc = codex::load_codex_settings(path)?;

    let outcome = match servers {
        Some(codex) if !codex.servers.is_empty() => {
            doc.insert(
                MCP_SERVERS_KEY.into(),
                Value::Object(codex.servers.clone()),
            );
            if codex.needs_rmcp_client {
                doc.insert(RMCP_CLIENT_KEY.into(), Value::Bool(true));
            }
            ApplyOutcome::Written {
                servers: codex.servers.len(),
            }
        }
        _ => {
            if doc.shift_remove(MCP_SERVERS_KEY).is_none() {
                return Ok(ApplyOutcome::Unchanged);
            }
            ApplyOutcome::Cleared
        }
    };

    codex::save_codex_settings(path, &doc)?;
    Ok(outcome)
}

fn json_target_servers(target: AppType, path: &Path) -> TargetServers {
    let mut status = TargetServers {
        target,
        path: path.to_path_buf(),
        exists: path.exists(),
        servers: Vec::new(),
        error: None,
    };
    match read_json_object(path) {
        Ok(doc) => {
            if let Some(Value::Object(servers)) = doc.get(JSON_SERVERS_KEY) {
                status.servers = servers.keys().cloned().collect();
            }
        }
        Err(e) => status.error = Some(e.to_string()),
    }
    status
}

fn codex_target_servers(path: &Path) -> TargetServers {
    let mut status = TargetServers {
        target: AppType::Codex,
        path: path.to_path_buf(),
        exists: path.exists(),
        servers: Vec::new(),
        error: None,
    };
    match codex::codex_status(path) {
        Ok(codex) => status.servers = codex.servers.into_iter().map(|s| s.name).collect(),
        Err(e) => status.error = Some(e.to_string()),
    }
    status
}
