//! Codex `config.toml` access

use crate::error::Result;
use crate::toml_lite::{self, Document, MCP_SERVERS_KEY};
use serde_json::Value;
use std::path::Path;

/// Top-level flag Codex needs before it will talk OAuth to HTTP servers
pub const RMCP_CLIENT_KEY: &str = "experimental_use_rmcp_client";

pub fn load_codex_settings(path: &Path) -> Result<Document> {
    toml_lite::read_file(path)
}

pub fn save_codex_settings(path: &Path, settings: &Document) -> Result<()> {
    toml_lite::write_file(path, settings)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodexTransport {
    Http { url: String },
    Stdio { command_line: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodexServer {
    pub name: String,
    pub transport: CodexTransport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodexStatus {
    pub exists: bool,
    pub servers: Vec<CodexServer>,
    pub rmcp_client: bool,
}

pub fn codex_status(path: &Path) -> Result<CodexStatus> {
    let exists = path.exists();
    let settings = load_codex_settings(path)?;

    let servers = settings
        .get(MCP_SERVERS_KEY)
        .and_then(Value::as_object)
        .map(|servers| {
            servers
                .iter()
                .map(|(name, cfg)| CodexServer {
                    name: name.clone(),
                    transport: describe(cfg),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CodexStatus {
        exists,
        servers,
        rmcp_client: settings
            .get(RMCP_CLIENT_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn describe(cfg: &Value) -> CodexTransport {
    if let Some(url) = cfg.get("url").and_then(Value::as_str) {
        return CodexTransport::Http {
            url: url.to_string(),
        };
    }
    let mut parts: Vec<&str> = cfg
        .get("command")
        .and_then(Value::as_str)
        .into_iter()
        .collect();
    if let Some(args) = cfg.get("args").and_then(Value::as_array) {
        parts.extend(args.iter().filter_map(Value::as_str));
    }
    CodexTransport::Stdio {
        command_line: parts.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn status_of_missing_file() {
        let dir = tempdir().unwrap();
        let status = codex_status(&dir.path().join("config.toml")).unwrap();
        assert_eq!(status, CodexStatus::default());
    }

    #[test]
    fn status_lists_servers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "experimental_use_rmcp_client = true\n\n[mcp_servers.c7]\ncommand = \"npx\"\nargs = [\"-y\", \"c7\"]\n\n[mcp_servers.gh]\nurl = \"https://gh\"\n",
        )
        .unwrap();

        let status = codex_status(&path).unwrap();
        assert!(status.exists);
        assert!(status.rmcp_client);
        assert_eq!(
            status.servers,
            vec![
                CodexServer {
                    name: "c7".into(),
                    transport: CodexTransport::Stdio {
                        command_line: "npx -y c7".into()
                    },
                },
                CodexServer {
                    name: "gh".into(),
                    transport: CodexTransport::Http {
                        url: "https://gh".into()
                    },
                },
            ]
        );
    }

    #[test]
    fn save_keeps_unrelated_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".codex").join("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "model = \"gpt-5\"\n[sandbox]\nmode = \"workspace-write\"\n").unwrap();

        let mut settings = load_codex_settings(&path).unwrap();
        settings.insert(RMCP_CLIENT_KEY.into(), Value::Bool(true));
        save_codex_settings(&path, &settings).unwrap();

        let back = load_codex_settings(&path).unwrap();
        assert_eq!(back["model"], "gpt-5");
        assert_eq!(back["sandbox"]["mode"], "workspace-write");
        assert_eq!(back[RMCP_CLIENT_KEY], true);
    }
}
