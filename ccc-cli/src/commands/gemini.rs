use super::Context;
use crate::{output, prompt};
use anyhow::Result;
use ccc_core::claude::mask_secret;
use ccc_core::gemini::{self, AuthFix, GeminiSettings, KeyWrite};
use ccc_core::{EnvKind, Environment};

pub fn set_api_key(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    let envs: Vec<&Environment> = registry
        .environments_of(&EnvKind::Gemini)
        .filter(|env| env.credential().is_some())
        .collect();

    let key = if envs.is_empty() {
        prompt::secret("Gemini API key")?
    } else {
        let mut items: Vec<String> = envs
            .iter()
            .map(|env| {
                let masked = env.credential().map(mask_secret).unwrap_or_default();
                format!("{} ({masked})", env.name)
            })
            .collect();
        items.push("Enter a key manually".to_string());

        let Some(idx) = prompt::select("Gemini API key from", &items, 0)? else {
            return Ok(());
        };
        match envs.get(idx) {
            Some(env) => env.credential().map(str::to_string),
            None => prompt::secret("Gemini API key")?,
        }
    };
    let Some(key) = key else {
        return Ok(());
    };

    let env_path = ctx.paths.gemini_env_path();
    match gemini::write_api_key(&env_path, &key)? {
        KeyWrite::Created => output::detail(format!("Created {}", env_path.display())),
        KeyWrite::Updated | KeyWrite::Appended => {}
    }
    output::success(format!("Gemini API key saved to {}", env_path.display()));

    match gemini::ensure_api_key_auth(&ctx.paths.gemini_settings_path())? {
        AuthFix::Unchanged => {}
        AuthFix::Created => output::detail("Created Gemini settings with API-key auth"),
        AuthFix::Corrected { previous } => output::warning(format!(
            "Gemini auth switched from {} to {}",
            previous.as_deref().unwrap_or("unset"),
            gemini::API_KEY_AUTH_TYPE
        )),
    }
    output::detail("No need to source anything; Gemini CLI reads the key on its next start.");
    Ok(())
}

pub fn auto_accept(ctx: &Context) -> Result<()> {
    let path = ctx.paths.gemini_settings_path();
    let (settings, _) = GeminiSettings::load_ensured(&path)?;
    let current = settings.auto_accept();

    let Some(enabled) = prompt::confirm(
        "Let Gemini auto-accept safe tool calls?",
        current,
    )?
    else {
        return Ok(());
    };

    gemini::set_auto_accept(&path, enabled)?;
    output::success(format!(
        "autoAccept {}",
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}
