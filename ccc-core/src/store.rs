//! Profile registry persistence
//!
//! Loading seeds a default registry on first run and migrates older files in
//! place. Migrations are additive only, and the file is rewritten only when
//! one of them actually changed something.

use crate::config::{write_json_file, ConfigPaths};
use crate::error::{CoreError, Result};
use crate::registry::{default_copy_keys, EnvKind, Registry, CLAUDE_FIELDS};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(paths: &ConfigPaths) -> Self {
        Self {
            path: paths.registry_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, optionally as a view filtered to one environment kind
    pub fn load(&self, kind: Option<&EnvKind>) -> Result<Registry> {
        let registry = self.load_full()?;
        Ok(match kind {
            Some(kind) => registry.filtered(kind),
            None => registry,
        })
    }

    fn load_full(&self) -> Result<Registry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let registry = Registry::seeded();
                self.try_save(&registry)?;
                log::info!("Created default profile registry at {}", self.path.display());
                return Ok(registry);
            }
            Err(e) => return Err(CoreError::io(&self.path, e)),
        };

        let mut value: Value =
            serde_json::from_str(&content).map_err(|source| CoreError::ConfigCorrupt {
                path: self.path.clone(),
                source,
            })?;

        if migrate(&mut value) {
            match write_json_file(&self.path, &value) {
                Ok(()) => log::info!(
                    "Profile registry {} updated to the current format",
                    self.path.display()
                ),
                Err(e) => log::warn!("Could not write migrated registry: {e}"),
            }
        }

        serde_json::from_value(value).map_err(|source| CoreError::ConfigCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Save the full registry as pretty JSON
    pub fn try_save(&self, registry: &Registry) -> Result<()> {
        if registry.view_kind().is_some() {
            return Err(CoreError::FilteredView);
        }
        let value = serde_json::to_value(registry).map_err(|e| CoreError::json(&self.path, e))?;
        write_json_file(&self.path, &value)
    }

    /// Like [`try_save`](Self::try_save), but reports failure as `false`
    pub fn save(&self, registry: &Registry) -> bool {
        match self.try_save(registry) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save profile registry: {e}");
                false
            }
        }
    }
}

/// Bring a raw registry document up to the current format.
///
/// Returns whether anything changed.
pub fn migrate(value: &mut Value) -> bool {
    let Some(root) = value.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    changed |= ensure_key(root, "environments", || Value::Array(Vec::new()));
    if let Some(envs) = root.get_mut("environments").and_then(Value::as_array_mut) {
        for env in envs.iter_mut().filter_map(Value::as_object_mut) {
            changed |= migrate_environment(env);
        }
    }

    changed |= ensure_key(root, "mcpServers", || Value::Object(Map::new()));
    changed |= ensure_key(root, "activeMcpServers", || Value::Array(Vec::new()));
    changed |= ensure_key(root, "activeEnvironment", || Value::Null);
    changed |= ensure_key(root, "copyKeys", || Value::from(default_copy_keys()));

    changed
}

fn ensure_key(root: &mut Map<String, Value>, key: &str, default: impl FnOnce() -> Value) -> bool {
    if root.contains_key(key) {
        return false;
    }
    root.insert(key.to_string(), default());
    true
}

fn migrate_environment(env: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    if env.get("type").is_none_or(Value::is_null) {
        env.insert("type".into(), Value::from(EnvKind::Claude.as_str()));
        changed = true;
    }

    let is_claude = env.get("type").and_then(Value::as_str) == Some(EnvKind::Claude.as_str());
    if let (true, Some(fast_key)) = (is_claude, CLAUDE_FIELDS.small_fast_model) {
        let model = env
            .get(CLAUDE_FIELDS.model)
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        if let Some(model) = model {
            if !env.contains_key(fast_key) {
                env.insert(fast_key.to_string(), Value::from(model));
                changed = true;
            }
        }
    }

    changed
}
