//! Claude `settings.json` reconciliation
//!
//! Switching copies the allow-listed `copyKeys` from an environment into
//! `settings.env`. The first switch snapshots the original `env` into
//! `env_bak`, and clearing restores that snapshot.

use crate::config::{read_json_file, write_json_file, ConfigPaths};
use crate::error::{CoreError, Result};
use crate::registry::{Environment, CLAUDE_FIELDS};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

const ENV_KEY: &str = "env";
const ENV_BACKUP_KEY: &str = "env_bak";
const PERMISSIONS_KEY: &str = "permissions";
const DEFAULT_MODE_KEY: &str = "defaultMode";

/// Values accepted by `permissions.defaultMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    Plan,
    BypassPermissions,
}

impl PermissionMode {
    pub const ALL: [PermissionMode; 4] = [
        PermissionMode::Default,
        PermissionMode::AcceptEdits,
        PermissionMode::Plan,
        PermissionMode::BypassPermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Plan => "plan",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }

    /// The mode named by a `defaultMode` value; `None` for values Claude does not know
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            PermissionMode::Default => "standard behavior",
            PermissionMode::AcceptEdits => "accept file edits automatically",
            PermissionMode::Plan => "plan only, no changes",
            PermissionMode::BypassPermissions => "skip every permission prompt",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// `env_bak` was moved back into `env`
    Restored,
    /// No backup; the copy keys were removed from `env`
    Stripped,
    NothingToClear,
}

/// What the view screen shows about the current settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsSummary {
    pub base_url: Option<String>,
    /// `("API Key" | "Auth Token", masked value)`
    pub credential: Option<(&'static str, String)>,
    pub default_mode: Option<String>,
}

/// Hide all but the edges of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn default_document() -> Value {
    json!({
        "permissions": { "allow": [], "deny": [] },
        "env": {}
    })
}

pub struct ClaudeSettings {
    path: PathBuf,
    doc: Value,
}

impl ClaudeSettings {
    /// Load the settings file for the session scope.
    ///
    /// A missing project file is created with defaults; a missing global
    /// file is an error.
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        let path = paths.claude_settings_path();
        match read_json_file(&path)? {
            Some(doc) => Ok(Self { path, doc }),
            None if paths.scope().is_project() => {
                let doc = default_document();
                write_json_file(&path, &doc)?;
                log::info!("Created default Claude settings at {}", path.display());
                Ok(Self { path, doc })
            }
            None => Err(CoreError::SettingsMissing(path)),
        }
    }

    pub fn from_value(path: impl Into<PathBuf>, doc: Value) -> Self {
        Self {
            path: path.into(),
            doc,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Value {
        &self.doc
    }

    pub fn save(&self) -> Result<()> {
        write_json_file(&self.path, &self.doc)
    }

    fn root_mut(&mut self) -> Result<&mut Map<String, Value>> {
        let path = self.path.display().to_string();
        self.doc
            .as_object_mut()
            .ok_or_else(|| CoreError::Config(format!("{path}: root must be a JSON object")))
    }

    pub fn env(&self) -> Option<&Map<String, Value>> {
        self.doc.get(ENV_KEY).and_then(Value::as_object)
    }

    pub fn env_backup(&self) -> Option<&Value> {
        self.doc.get(ENV_BACKUP_KEY)
    }

    fn env_str(&self, key: &str) -> Option<&str> {
        self.env()
            .and_then(|env| env.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn credential(&self) -> Option<(&'static str, &str)> {
        if let Some(key) = self.env_str(CLAUDE_FIELDS.api_key) {
            return Some(("API Key", key));
        }
        CLAUDE_FIELDS
            .auth_token
            .and_then(|t| self.env_str(t))
            .map(|token| ("Auth Token", token))
    }

    /// Whether `env` carries a base URL or credential
    pub fn has_proxy_config(&self) -> bool {
        self.env_str(CLAUDE_FIELDS.base_url).is_some() || self.credential().is_some()
    }

    /// Apply `env` using `copy_keys` as the allow-list
    pub fn switch_to(&mut self, env: &Environment, copy_keys: &[String]) -> Result<()> {
        let root = self.root_mut()?;

        if !root.contains_key(ENV_BACKUP_KEY) {
            let snapshot = root
                .get(ENV_KEY)
                .filter(|v| v.is_object())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            root.insert(ENV_BACKUP_KEY.to_string(), snapshot);
        }

        if !root.get(ENV_KEY).is_some_and(Value::is_object) {
            root.insert(ENV_KEY.to_string(), Value::Object(Map::new()));
        }
        let Some(Value::Object(target)) = root.get_mut(ENV_KEY) else {
            return Err(CoreError::Config("settings env is not an object".into()));
        };

        for key in copy_keys {
            target.shift_remove(key);
        }
        for key in copy_keys {
            match env.field(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(value) => {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Undo switching: restore the backup, or strip the copy keys
    pub fn clear(&mut self, copy_keys: &[String]) -> Result<ClearOutcome> {
        let root = self.root_mut()?;

        if let Some(backup) = root.shift_remove(ENV_BACKUP_KEY) {
            root.insert(ENV_KEY.to_string(), backup);
            return Ok(ClearOutcome::Restored);
        }

        let Some(Value::Object(env)) = root.get_mut(ENV_KEY) else {
            return Ok(ClearOutcome::NothingToClear);
        };
        let before = env.len();
        for key in copy_keys {
            env.shift_remove(key);
        }
        let removed = env.len() != before;
        if env.is_empty() {
            root.shift_remove(ENV_KEY);
        }

        Ok(if removed {
            ClearOutcome::Stripped
        } else {
            ClearOutcome::NothingToClear
        })
    }

    pub fn default_mode(&self) -> Option<&str> {
        self.doc
            .get(PERMISSIONS_KEY)
            .and_then(|p| p.get(DEFAULT_MODE_KEY))
            .and_then(Value::as_str)
    }

    /// `defaultMode` as a known mode
    pub fn permission_mode(&self) -> Option<PermissionMode> {
        self.default_mode().and_then(PermissionMode::parse)
    }

    /// Set `permissions.defaultMode`, or remove it with `None`
    pub fn set_default_mode(&mut self, mode: Option<PermissionMode>) -> Result<()> {
        let root = self.root_mut()?;
        match mode {
            Some(mode) => {
                if !root.get(PERMISSIONS_KEY).is_some_and(Value::is_object) {
                    root.insert(PERMISSIONS_KEY.to_string(), Value::Object(Map::new()));
                }
                if let Some(Value::Object(permissions)) = root.get_mut(PERMISSIONS_KEY) {
                    permissions.insert(DEFAULT_MODE_KEY.to_string(), Value::from(mode.as_str()));
                }
            }
            None => {
                if let Some(Value::Object(permissions)) = root.get_mut(PERMISSIONS_KEY) {
                    permissions.shift_remove(DEFAULT_MODE_KEY);
                    if permissions.is_empty() {
                        root.shift_remove(PERMISSIONS_KEY);
                    }
                }
            }
        }
        Ok(())
    }

    /// Index of the environment whose base URL and credential match `env`
    pub fn current_environment<'a, I>(&self, envs: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a Environment>,
    {
        if !self.has_proxy_config() {
            return None;
        }
        let base_url = self.env_str(CLAUDE_FIELDS.base_url);
        let credential = self.credential().map(|(_, value)| value);
        envs.into_iter()
            .position(|env| env.base_url() == base_url && env.credential() == credential)
    }

    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            base_url: self.env_str(CLAUDE_FIELDS.base_url).map(str::to_string),
            credential: self
                .credential()
                .map(|(kind, value)| (kind, mask_secret(value))),
            default_mode: self.default_mode().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scope;
    use crate::registry::{default_copy_keys, EnvKind};
    use tempfile::tempdir;

    fn env_a() -> Environment {
        Environment::new("a", EnvKind::Claude)
            .with_field("ANTHROPIC_API_KEY", "sk-aaaaaaaaaaaaaaaa")
            .with_field("ANTHROPIC_BASE_URL", "https://a.example")
            .with_field("ANTHROPIC_MODEL", "model-a")
    }

    fn env_b() -> Environment {
        Environment::new("b", EnvKind::Claude)
            .with_field("ANTHROPIC_AUTH_TOKEN", "tok-bbbbbbbbbbbbbbbb")
            .with_field("ANTHROPIC_BASE_URL", "https://b.example")
    }

    #[test]
    fn permission_mode_reads_known_values_only() {
        let settings = ClaudeSettings::from_value(
            "/tmp/s.json",
            json!({"permissions": {"defaultMode": "plan"}}),
        );
        assert_eq!(settings.permission_mode(), Some(PermissionMode::Plan));

        let unknown = ClaudeSettings::from_value(
            "/tmp/s.json",
            json!({"permissions": {"defaultMode": "yolo"}}),
        );
        assert_eq!(unknown.default_mode(), Some("yolo"));
        assert_eq!(unknown.permission_mode(), None);
    }

    #[test]
    fn mask_keeps_edges() {
        assert_eq!(mask_secret("sk-ant-1234567890abcd"), "sk-ant-1...abcd");
        assert_eq!(mask_secret("short"), "****");
    }

    #[test]
    fn switch_keeps_unrelated_env_keys() {
        let mut settings = ClaudeSettings::from_value(
            "/tmp/settings.json",
            json!({"env": {"DISABLE_TELEMETRY": "1"}, "model": "opus"}),
        );
        settings.switch_to(&env_a(), &default_copy_keys()).unwrap();

        let doc = settings.document();
        assert_eq!(doc["env"]["DISABLE_TELEMETRY"], "1");
        assert_eq!(doc["env"]["ANTHROPIC_MODEL"], "model-a");
        assert_eq!(doc["model"], "opus");
        assert_eq!(doc["env_bak"], json!({"DISABLE_TELEMETRY": "1"}));
    }

    #[test]
    fn switch_without_env_backs_up_empty_object() {
        let mut settings = ClaudeSettings::from_value("/tmp/s.json", json!({}));
        settings.switch_to(&env_b(), &default_copy_keys()).unwrap();
        assert_eq!(settings.document()["env_bak"], json!({}));

        assert_eq!(
            settings.clear(&default_copy_keys()).unwrap(),
            ClearOutcome::Restored
        );
        assert_eq!(settings.document()["env"], json!({}));
    }

    #[test]
    fn clear_without_backup_strips_copy_keys() {
        let mut settings = ClaudeSettings::from_value(
            "/tmp/s.json",
            json!({"env": {"ANTHROPIC_BASE_URL": "https://x", "ANTHROPIC_API_KEY": "k"}}),
        );
        assert_eq!(
            settings.clear(&default_copy_keys()).unwrap(),
            ClearOutcome::Stripped
        );
        assert!(settings.document().get("env").is_none());

        assert_eq!(
            settings.clear(&default_copy_keys()).unwrap(),
            ClearOutcome::NothingToClear
        );
    }

    #[test]
    fn clear_strip_keeps_other_keys() {
        let mut settings = ClaudeSettings::from_value(
            "/tmp/s.json",
            json!({"env": {"ANTHROPIC_API_KEY": "k", "OTHER": "v"}}),
        );
        settings.clear(&default_copy_keys()).unwrap();
        assert_eq!(settings.document()["env"], json!({"OTHER": "v"}));
    }

    #[test]
    fn default_mode_set_and_clear() {
        let mut settings = ClaudeSettings::from_value("/tmp/s.json", json!({}));
        settings
            .set_default_mode(Some(PermissionMode::AcceptEdits))
            .unwrap();
        assert_eq!(settings.default_mode(), Some("acceptEdits"));
        assert_eq!(settings.permission_mode(), Some(PermissionMode::AcceptEdits));

        settings.set_default_mode(None).unwrap();
        assert_eq!(settings.document(), &json!({}));
    }

    #[test]
    fn clearing_mode_keeps_other_permissions() {
        let mut settings = ClaudeSettings::from_value(
            "/tmp/s.json",
            json!({"permissions": {"allow": ["Bash"], "defaultMode": "plan"}}),
        );
        settings.set_default_mode(None).unwrap();
        assert_eq!(settings.document()["permissions"], json!({"allow": ["Bash"]}));
    }

    #[test]
    fn detects_current_environment() {
        let envs = vec![env_a(), env_b()];
        let mut settings = ClaudeSettings::from_value("/tmp/s.json", json!({}));
        assert_eq!(settings.current_environment(&envs), None);

        settings.switch_to(&envs[1], &default_copy_keys()).unwrap();
        assert_eq!(settings.current_environment(&envs), Some(1));

        let summary = settings.summary();
        assert_eq!(summary.base_url.as_deref(), Some("https://b.example"));
        assert_eq!(summary.credential.as_ref().map(|c| c.0), Some("Auth Token"));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let mut settings = ClaudeSettings::from_value("/tmp/s.json", json!([1]));
        assert!(matches!(
            settings.switch_to(&env_a(), &default_copy_keys()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn missing_global_settings_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = ConfigPaths::with_home(dir.path(), Scope::Global);
        assert!(matches!(
            ClaudeSettings::load(&paths),
            Err(CoreError::SettingsMissing(_))
        ));
    }

    #[test]
    fn missing_project_settings_are_created() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("proj");
        let paths = ConfigPaths::with_home(dir.path(), Scope::Project(project.clone()));

        let settings = ClaudeSettings::load(&paths).unwrap();
        assert_eq!(settings.document()["env"], json!({}));
        assert!(project.join(".claude").join("settings.json").exists());
    }
}
