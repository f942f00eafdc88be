//! Profile registry types
//!
//! The registry (`configs.json`) holds every environment profile and MCP
//! server definition the user manages, plus the current MCP selection.

use crate::error::{CoreError, Result};
use crate::version::VersionCache;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_COPY_KEYS: [&str; 5] = [
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_AUTH_TOKEN",
    "ANTHROPIC_BASE_URL",
    "ANTHROPIC_MODEL",
    "ANTHROPIC_SMALL_FAST_MODEL",
];

pub fn default_copy_keys() -> Vec<String> {
    DEFAULT_COPY_KEYS.iter().map(|k| k.to_string()).collect()
}

/// Environment kind, keyed by the `type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvKind {
    #[default]
    Claude,
    Gemini,
    Other(String),
}

impl EnvKind {
    pub fn as_str(&self) -> &str {
        match self {
            EnvKind::Claude => "claude",
            EnvKind::Gemini => "gemini",
            EnvKind::Other(s) => s,
        }
    }

    /// Well-known provider field names, `None` for kinds we know nothing about
    pub fn field_names(&self) -> Option<&'static FieldNames> {
        match self {
            EnvKind::Claude => Some(&CLAUDE_FIELDS),
            EnvKind::Gemini => Some(&GEMINI_FIELDS),
            EnvKind::Other(_) => None,
        }
    }
}

impl From<String> for EnvKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "claude" => EnvKind::Claude,
            "gemini" => EnvKind::Gemini,
            _ => EnvKind::Other(s),
        }
    }
}

impl From<EnvKind> for String {
    fn from(kind: EnvKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct FieldNames {
    pub api_key: &'static str,
    pub auth_token: Option<&'static str>,
    pub base_url: &'static str,
    pub model: &'static str,
    pub small_fast_model: Option<&'static str>,
}

pub static CLAUDE_FIELDS: FieldNames = FieldNames {
    api_key: "ANTHROPIC_API_KEY",
    auth_token: Some("ANTHROPIC_AUTH_TOKEN"),
    base_url: "ANTHROPIC_BASE_URL",
    model: "ANTHROPIC_MODEL",
    small_fast_model: Some("ANTHROPIC_SMALL_FAST_MODEL"),
};

pub static GEMINI_FIELDS: FieldNames = FieldNames {
    api_key: "GEMINI_API_KEY",
    auth_token: None,
    base_url: "GEMINI_BASE_URL",
    model: "GEMINI_MODEL",
    small_fast_model: None,
};

/// A named bundle of provider credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EnvKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Provider-specific fields, copied verbatim
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Environment {
    pub fn new(name: impl Into<String>, kind: EnvKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Whether this record shows up when `kind` is requested
    pub fn matches_kind(&self, kind: &EnvKind) -> bool {
        &self.kind == kind
    }

    /// API key, or the auth token for kinds that accept one
    pub fn credential(&self) -> Option<&str> {
        let names = self.kind.field_names()?;
        self.field_str(names.api_key)
            .or_else(|| names.auth_token.and_then(|t| self.field_str(t)))
    }

    pub fn base_url(&self) -> Option<&str> {
        self.kind
            .field_names()
            .and_then(|names| self.field_str(names.base_url))
    }

    pub fn model(&self) -> Option<&str> {
        self.kind
            .field_names()
            .and_then(|names| self.field_str(names.model))
    }
}

/// Typed view of a [`ServerDefinition`]
#[derive(Debug, Clone, PartialEq)]
pub enum ServerSpec {
    Stdio {
        command: String,
        args: Vec<String>,
        env: IndexMap<String, String>,
    },
    Http {
        url: Option<String>,
        bearer_token: Option<String>,
        /// Set when the server declares `oauth` or `experimental_use_rmcp_client`
        oauth: bool,
    },
}

/// MCP server definition, stored exactly as the user wrote it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerDefinition(Map<String, Value>);

impl ServerDefinition {
    pub fn stdio(command: &str, args: &[&str]) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), Value::from("stdio"));
        map.insert("command".into(), Value::from(command));
        map.insert("args".into(), Value::from(args.to_vec()));
        Self(map)
    }

    pub fn http(url: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), Value::from("http"));
        map.insert("url".into(), Value::from(url));
        Self(map)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Declared transport, `stdio` when absent
    pub fn transport(&self) -> &str {
        self.0
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("stdio")
    }

    /// Check the shape against the declared transport
    pub fn spec(&self, name: &str) -> Result<ServerSpec> {
        let invalid = |reason: &str| CoreError::InvalidServer {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let get_str = |key: &str| {
            self.0
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match self.transport() {
            "stdio" => {
                let command = get_str("command").ok_or_else(|| invalid("stdio server has no command"))?;
                let args = match self.0.get("args") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
                    Some(_) => return Err(invalid("args must be an array")),
                };
                let env = match self.0.get("env") {
                    None | Some(Value::Null) => IndexMap::new(),
                    Some(Value::Object(vars)) => vars
                        .iter()
                        .map(|(k, v)| (k.clone(), value_to_string(v)))
                        .collect(),
                    Some(_) => return Err(invalid("env must be an object")),
                };
                Ok(ServerSpec::Stdio { command, args, env })
            }
            "http" => {
                let oauth = self.0.get("oauth").is_some_and(truthy)
                    || self.0.get("experimental_use_rmcp_client").is_some_and(truthy);
                Ok(ServerSpec::Http {
                    url: get_str("url"),
                    bearer_token: get_str("bearer_token"),
                    oauth,
                })
            }
            other => Err(invalid(&format!("unknown type '{other}'"))),
        }
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The whole `configs.json` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: IndexMap<String, ServerDefinition>,
    #[serde(rename = "activeMcpServers", default)]
    pub active_mcp_servers: Vec<String>,
    #[serde(rename = "activeEnvironment", default)]
    pub active_environment: Option<String>,
    #[serde(rename = "copyKeys", default = "default_copy_keys")]
    pub copy_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(rename = "versionCache", default, skip_serializing_if = "Option::is_none")]
    pub version_cache: Option<VersionCache>,
    /// Keys this tool does not know about, preserved on save
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(skip)]
    view: Option<EnvKind>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            environments: Vec::new(),
            mcp_servers: IndexMap::new(),
            active_mcp_servers: Vec::new(),
            active_environment: None,
            copy_keys: default_copy_keys(),
            editor: None,
            version_cache: None,
            extra: IndexMap::new(),
            view: None,
        }
    }
}

impl Registry {
    /// Registry written on first run
    pub fn seeded() -> Self {
        let mut registry = Self::default();
        registry.environments = vec![
            Environment::new("anthropic-official", EnvKind::Claude)
                .with_field("ANTHROPIC_API_KEY", "sk-your-api-key-here")
                .with_field("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            Environment::new("google-gemini-official", EnvKind::Gemini)
                .with_field("GEMINI_API_KEY", "your-gemini-api-key-here"),
        ];
        registry.mcp_servers.insert(
            "context7".into(),
            ServerDefinition::stdio("npx", &["-y", "@upstash/context7-mcp"]),
        );
        registry.mcp_servers.insert(
            "github".into(),
            ServerDefinition::http("https://api.githubcopilot.com/mcp/")
                .with("bearer_token", "your-github-token-here"),
        );
        registry
    }

    /// Copy restricted to environments of one kind
    pub fn filtered(&self, kind: &EnvKind) -> Self {
        let mut view = self.clone();
        view.environments.retain(|env| env.matches_kind(kind));
        view.view = Some(kind.clone());
        view
    }

    /// Kind this registry was filtered to, if it is a view
    pub fn view_kind(&self) -> Option<&EnvKind> {
        self.view.as_ref()
    }

    pub fn environments_of<'a>(&'a self, kind: &EnvKind) -> impl Iterator<Item = &'a Environment> + 'a {
        let kind = kind.clone();
        self.environments
            .iter()
            .filter(move |env| env.matches_kind(&kind))
    }

    pub fn find_environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }

    pub fn add_environment(&mut self, env: Environment) -> Result<()> {
        if self.find_environment(&env.name).is_some() {
            return Err(CoreError::DuplicateEnvironment(env.name));
        }
        self.environments.push(env);
        Ok(())
    }

    /// Replace the environment called `name`, keeping its position
    pub fn update_environment(&mut self, name: &str, env: Environment) -> Result<()> {
        if env.name != name && self.find_environment(&env.name).is_some() {
            return Err(CoreError::DuplicateEnvironment(env.name));
        }
        let slot = self
            .environments
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| CoreError::EnvironmentNotFound(name.to_string()))?;
        *slot = env;
        Ok(())
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<Environment> {
        let idx = self
            .environments
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| CoreError::EnvironmentNotFound(name.to_string()))?;
        if self.active_environment.as_deref() == Some(name) {
            self.active_environment = None;
        }
        Ok(self.environments.remove(idx))
    }

    /// Replace the active MCP set; unknown and repeated names are dropped
    pub fn set_active_mcp_servers<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut active: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if self.mcp_servers.contains_key(&name) && !active.contains(&name) {
                active.push(name);
            }
        }
        self.active_mcp_servers = active;
    }

    pub fn is_mcp_active(&self, name: &str) -> bool {
        self.active_mcp_servers.iter().any(|n| n == name)
    }
}
