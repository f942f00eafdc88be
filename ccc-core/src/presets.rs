//! Provider templates offered when adding an environment

use crate::registry::{EnvKind, Environment};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Claude,
    Kimi,
    Zhipu,
    Deepseek,
    Gemini,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Claude,
        Preset::Kimi,
        Preset::Zhipu,
        Preset::Deepseek,
        Preset::Gemini,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Claude => "Claude (Anthropic)",
            Preset::Kimi => "Kimi (Moonshot)",
            Preset::Zhipu => "Zhipu GLM",
            Preset::Deepseek => "DeepSeek",
            Preset::Gemini => "Gemini (Google)",
        }
    }

    pub fn kind(&self) -> EnvKind {
        match self {
            Preset::Gemini => EnvKind::Gemini,
            _ => EnvKind::Claude,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Preset::Claude => "https://api.anthropic.com",
            Preset::Kimi => "https://api.moonshot.cn/anthropic",
            Preset::Zhipu => "https://open.bigmodel.cn/api/anthropic",
            Preset::Deepseek => "https://api.deepseek.com/anthropic",
            Preset::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Preset::Claude => "claude-3-5-sonnet-20241022",
            Preset::Kimi => "kimi-k2-turbo-preview",
            Preset::Zhipu => "glm-4",
            Preset::Deepseek => "deepseek-chat",
            Preset::Gemini => "gemini-2.5-pro",
        }
    }

    /// Field the API key is stored under
    pub fn api_key_field(&self) -> &'static str {
        self.kind()
            .field_names()
            .map(|names| names.api_key)
            .unwrap_or("API_KEY")
    }

    /// Assemble an environment; empty strings are treated as absent
    pub fn build(
        &self,
        name: &str,
        description: Option<&str>,
        api_key: &str,
        base_url: Option<&str>,
        model: Option<&str>,
    ) -> Environment {
        let kind = self.kind();
        let mut env = Environment::new(name.trim(), kind.clone());
        env.description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let Some(names) = kind.field_names() else {
            return env;
        };

        env.set_field(names.api_key, api_key.trim());
        if let Some(url) = base_url.map(str::trim).filter(|u| !u.is_empty()) {
            env.set_field(names.base_url, url);
        }
        if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
            env.set_field(names.model, model);
            if let Some(small_fast) = names.small_fast_model {
                env.set_field(small_fast, model);
            }
        }
        env
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
