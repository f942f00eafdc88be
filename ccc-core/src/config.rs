//! Path resolution and file helpers
//!
//! Every location the tool reads or writes is derived from a [`ConfigPaths`]
//! value built once at startup and passed down explicitly.

use crate::error::{CoreError, Result};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Overrides the home directory used for every path (tests, sandboxes).
pub const HOME_OVERRIDE_ENV: &str = "CCC_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppType {
    Claude,
    Codex,
    Gemini,
}

impl AppType {
    pub fn as_str(&self) -> &str {
        match self {
            AppType::Claude => "claude",
            AppType::Codex => "codex",
            AppType::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AppType::Claude => "Claude",
            AppType::Codex => "Codex",
            AppType::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which Claude settings file the session edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Project(PathBuf),
}

impl Scope {
    pub fn is_project(&self) -> bool {
        matches!(self, Scope::Project(_))
    }
}

/// All file locations used by the tool, rooted at one home directory.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    home: PathBuf,
    scope: Scope,
}

impl ConfigPaths {
    /// Resolve from `CCC_HOME` or the user's home directory
    pub fn resolve(scope: Scope) -> Result<Self> {
        let home = match std::env::var_os(HOME_OVERRIDE_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or_else(|| CoreError::Config("cannot determine home directory".into()))?,
        };
        Ok(Self::with_home(home, scope))
    }

    pub fn with_home(home: impl Into<PathBuf>, scope: Scope) -> Self {
        Self {
            home: home.into(),
            scope,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn config_dir(&self) -> PathBuf {
        self.home.join(".claude-code-config")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.config_dir().join("configs.json")
    }

    /// `settings.json` for the active scope
    pub fn claude_settings_path(&self) -> PathBuf {
        match &self.scope {
            Scope::Global => self.home.join(".claude").join("settings.json"),
            Scope::Project(root) => root.join(".claude").join("settings.json"),
        }
    }

    /// Claude's global MCP registry (`~/.claude.json`)
    pub fn claude_mcp_path(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    pub fn gemini_dir(&self) -> PathBuf {
        self.home.join(".gemini")
    }

    pub fn gemini_settings_path(&self) -> PathBuf {
        self.gemini_dir().join("settings.json")
    }

    pub fn gemini_env_path(&self) -> PathBuf {
        self.gemini_dir().join(".env")
    }

    pub fn codex_dir(&self) -> PathBuf {
        self.home.join(".codex")
    }

    pub fn codex_config_path(&self) -> PathBuf {
        self.codex_dir().join("config.toml")
    }
}

/// Read a JSON document, `None` when the file does not exist
pub fn read_json_file(path: &Path) -> Result<Option<Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoreError::io(path, e)),
    };
    let value = serde_json::from_str(&content).map_err(|e| CoreError::json(path, e))?;
    Ok(Some(value))
}

/// Write a value as pretty JSON, replacing the file atomically
pub fn write_json_file(path: &Path, value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CoreError::json(path, e))?;
    write_text_file(path, &json)
}

/// Write text through a sibling temp file and rename it into place
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| CoreError::io(&parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| CoreError::io(&parent, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| CoreError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn project_scope_redirects_claude_settings_only() {
        let global = ConfigPaths::with_home("/home/u", Scope::Global);
        let project = ConfigPaths::with_home("/home/u", Scope::Project("/work/app".into()));

        assert_eq!(
            global.claude_settings_path(),
            PathBuf::from("/home/u/.claude/settings.json")
        );
        assert_eq!(
            project.claude_settings_path(),
            PathBuf::from("/work/app/.claude/settings.json")
        );
        assert_eq!(global.registry_path(), project.registry_path());
        assert_eq!(project.claude_mcp_path(), PathBuf::from("/home/u/.claude.json"));
    }

    #[test]
    fn write_json_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("x.json");

        write_json_file(&path, &serde_json::json!({"k": 1})).unwrap();
        let back = read_json_file(&path).unwrap().unwrap();
        assert_eq!(back["k"], 1);
    }

    #[test]
    fn read_missing_json_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_json_file(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn read_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_json_file(&path),
            Err(CoreError::Json { .. })
        ));
    }
}
