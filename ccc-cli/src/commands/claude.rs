use super::Context;
use crate::{output, prompt};
use anyhow::{Context as _, Result};
use ccc_core::claude::mask_secret;
use ccc_core::{ClaudeSettings, ClearOutcome, EnvKind, Environment, PermissionMode, Scope};
use console::style;

fn load_settings(ctx: &Context) -> Result<ClaudeSettings> {
    let settings = ClaudeSettings::load(&ctx.paths)?;
    Ok(settings)
}

fn save_settings(settings: &ClaudeSettings) -> Result<()> {
    settings
        .save()
        .with_context(|| format!("Failed to write {}", settings.path().display()))
}

pub fn switch(ctx: &Context) -> Result<()> {
    let mut registry = ctx.registry()?;
    let envs: Vec<&Environment> = registry.environments_of(&EnvKind::Claude).collect();
    if envs.is_empty() {
        output::warning("No Claude environments configured. Add one under Environments.");
        return Ok(());
    }

    let mut settings = load_settings(ctx)?;
    let current = settings.current_environment(envs.iter().copied());

    let items: Vec<String> = envs
        .iter()
        .enumerate()
        .map(|(i, env)| {
            let marker = if current == Some(i) { " ✓" } else { "" };
            let url = env.base_url().unwrap_or("default endpoint");
            format!("{} ({url}){marker}", env.name)
        })
        .collect();

    let Some(idx) = prompt::select("Switch Claude to", &items, current.unwrap_or(0))? else {
        return Ok(());
    };
    let env = envs[idx];
    let name = env.name.clone();

    settings.switch_to(env, &registry.copy_keys)?;
    save_settings(&settings)?;

    output::success(format!("Switched to {name}"));
    if let Some(url) = env.base_url() {
        output::detail(format!("Base URL: {url}"));
    }
    if let Some(credential) = env.credential() {
        output::detail(format!("Credential: {}", mask_secret(credential)));
    }
    output::detail(format!("Settings: {}", settings.path().display()));

    registry.active_environment = Some(name);
    ctx.save(&registry);
    Ok(())
}

pub fn permission_mode(ctx: &Context) -> Result<()> {
    let mut settings = load_settings(ctx)?;
    let mut items: Vec<String> = PermissionMode::ALL
        .iter()
        .map(|mode| format!("{:<18} {}", mode.as_str(), style(mode.description()).dim()))
        .collect();
    items.push("Unset (remove defaultMode)".to_string());

    let default = settings
        .permission_mode()
        .and_then(|current| PermissionMode::ALL.iter().position(|m| *m == current))
        .unwrap_or(items.len() - 1);

    let Some(idx) = prompt::select("Default permission mode", &items, default)? else {
        return Ok(());
    };
    let mode = PermissionMode::ALL.get(idx).copied();

    settings.set_default_mode(mode)?;
    save_settings(&settings)?;

    match mode {
        Some(mode) => output::success(format!("defaultMode set to {mode}")),
        None => output::success("defaultMode removed"),
    }
    Ok(())
}

pub fn view(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    let settings = load_settings(ctx)?;
    let summary = settings.summary();

    let scope = match ctx.paths.scope() {
        Scope::Global => "global".to_string(),
        Scope::Project(root) => format!("project {}", root.display()),
    };
    output::heading(format!("Claude settings ({scope})"));
    output::detail(format!("File: {}", settings.path().display()));

    if !settings.has_proxy_config() {
        println!("  No proxy configuration");
    } else {
        println!("  Base URL: {}", output::or_dash(summary.base_url.as_deref()));
        if let Some((label, masked)) = &summary.credential {
            println!("  {label}: {masked}");
        }
        match settings.current_environment(registry.environments_of(&EnvKind::Claude)) {
            Some(idx) => {
                let name = registry
                    .environments_of(&EnvKind::Claude)
                    .nth(idx)
                    .map(|env| env.name.as_str())
                    .unwrap_or("-");
                println!("  Environment: {}", style(name).green());
            }
            None => println!("  Environment: {}", style("custom configuration").yellow()),
        }
    }

    match &summary.default_mode {
        Some(mode) => println!("  Default mode: {mode}"),
        None => println!("  Default mode: {}", style("not set").dim()),
    }
    println!();
    Ok(())
}

pub fn clear(ctx: &Context) -> Result<()> {
    let mut settings = load_settings(ctx)?;
    if !settings.has_proxy_config() && settings.env_backup().is_none() {
        output::warning("settings.json has no proxy configuration to clear.");
        return Ok(());
    }

    let Some(true) = prompt::confirm("Clear the proxy configuration from settings.json?", false)?
    else {
        return Ok(());
    };

    let mut registry = ctx.registry()?;
    let outcome = settings.clear(&registry.copy_keys)?;
    if outcome == ClearOutcome::NothingToClear {
        output::warning("Nothing to clear.");
        return Ok(());
    }
    save_settings(&settings)?;

    match outcome {
        ClearOutcome::Restored => output::success("Restored the environment saved before the first switch"),
        _ => output::success("Removed proxy keys from settings.json"),
    }

    registry.active_environment = None;
    ctx.save(&registry);
    Ok(())
}
