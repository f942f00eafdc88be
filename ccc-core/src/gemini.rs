//! Gemini CLI credentials and settings
//!
//! The API key lives in `~/.gemini/.env` as a shell-style assignment; the
//! settings file must select API-key authentication for it to be used.

use crate::config::{read_json_file, write_json_file, write_text_file};
use crate::error::{CoreError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const API_KEY_NAME: &str = "GEMINI_API_KEY";
pub const API_KEY_AUTH_TYPE: &str = "gemini-api-key";
pub const MANAGED_MARKER: &str = "# Managed by claude-code-config";

const AUTH_TYPE_KEY: &str = "selectedAuthType";
const AUTO_ACCEPT_KEY: &str = "autoAccept";

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?GEMINI_API_KEY\s*=\s*(.*)$").expect("valid key-line regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWrite {
    /// The `.env` file did not exist
    Created,
    /// An existing assignment was rewritten in place
    Updated,
    /// The file existed without an assignment; one was appended
    Appended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFix {
    Unchanged,
    Corrected { previous: Option<String> },
    Created,
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::io(path, e)),
    }
}

fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let quoted = trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')));
    if !quoted {
        return trimmed.to_string();
    }

    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '"' | '\'' | '\\') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn format_key_line(key: &str) -> String {
    let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{API_KEY_NAME}=\"{escaped}\"")
}

/// First `GEMINI_API_KEY` assignment in the env file
pub fn read_api_key(path: &Path) -> Result<Option<String>> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };
    Ok(content
        .lines()
        .find_map(|line| KEY_LINE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| strip_quotes(m.as_str())))
}

/// Store `key` in the env file, rewriting an existing assignment in place
pub fn write_api_key(path: &Path, key: &str) -> Result<KeyWrite> {
    let existing = read_optional(path)?;
    let mut lines: Vec<String> = existing
        .as_deref()
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default();

    let mut updated = false;
    for line in lines.iter_mut() {
        if KEY_LINE.is_match(line) {
            *line = format_key_line(key);
            updated = true;
        }
    }

    if !updated {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(MANAGED_MARKER.to_string());
        lines.push(format_key_line(key));
    }

    let content = format!("{}\n", lines.join("\n").trim_end());
    write_text_file(path, &content)?;

    Ok(match (existing, updated) {
        (None, _) => KeyWrite::Created,
        (Some(_), true) => KeyWrite::Updated,
        (Some(_), false) => KeyWrite::Appended,
    })
}

/// `~/.gemini/settings.json`, guaranteed to select API-key auth
pub struct GeminiSettings {
    path: PathBuf,
    doc: Map<String, Value>,
}

impl GeminiSettings {
    fn fresh(path: &Path) -> Self {
        let mut doc = Map::new();
        doc.insert(AUTH_TYPE_KEY.into(), Value::from(API_KEY_AUTH_TYPE));
        doc.insert(AUTO_ACCEPT_KEY.into(), Value::Bool(false));
        Self {
            path: path.to_path_buf(),
            doc,
        }
    }

    /// Load the settings, fixing or creating them so API-key auth is selected
    pub fn load_ensured(path: &Path) -> Result<(Self, AuthFix)> {
        let loaded = match read_json_file(path) {
            Ok(Some(Value::Object(doc))) => Some(doc),
            Ok(Some(_)) => {
                log::warn!("{} is not a JSON object; recreating it", path.display());
                None
            }
            Ok(None) => None,
            Err(CoreError::Json { source, .. }) => {
                log::warn!("Could not parse {}: {source}; recreating it", path.display());
                None
            }
            Err(e) => return Err(e),
        };

        let Some(mut doc) = loaded else {
            let settings = Self::fresh(path);
            settings.save()?;
            return Ok((settings, AuthFix::Created));
        };

        let current = doc.get(AUTH_TYPE_KEY).and_then(Value::as_str);
        if current == Some(API_KEY_AUTH_TYPE) {
            let settings = Self {
                path: path.to_path_buf(),
                doc,
            };
            return Ok((settings, AuthFix::Unchanged));
        }

        let previous = current.map(str::to_string);
        log::warn!(
            "Gemini auth type was {:?}; switching it to \"{API_KEY_AUTH_TYPE}\"",
            previous.as_deref().unwrap_or("unset")
        );
        doc.insert(AUTH_TYPE_KEY.into(), Value::from(API_KEY_AUTH_TYPE));
        let settings = Self {
            path: path.to_path_buf(),
            doc,
        };
        settings.save()?;
        Ok((settings, AuthFix::Corrected { previous }))
    }

    pub fn auto_accept(&self) -> bool {
        self.doc
            .get(AUTO_ACCEPT_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_auto_accept(&mut self, enabled: bool) {
        self.doc.insert(AUTO_ACCEPT_KEY.into(), Value::Bool(enabled));
        self.doc
            .insert(AUTH_TYPE_KEY.into(), Value::from(API_KEY_AUTH_TYPE));
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.doc
    }

    pub fn save(&self) -> Result<()> {
        write_json_file(&self.path, &Value::Object(self.doc.clone()))
    }
}

/// Make sure Gemini selects API-key auth, correcting the settings if needed
pub fn ensure_api_key_auth(settings_path: &Path) -> Result<AuthFix> {
    GeminiSettings::load_ensured(settings_path).map(|(_, fix)| fix)
}

pub fn set_auto_accept(settings_path: &Path, enabled: bool) -> Result<()> {
    let (mut settings, _) = GeminiSettings::load_ensured(settings_path)?;
    settings.set_auto_accept(enabled);
    settings.save()
}
