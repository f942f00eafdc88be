use super::Context;
use crate::output::{self, create_table};
use crate::prompt;
use anyhow::Result;
use ccc_core::claude::mask_secret;
use ccc_core::{Environment, Preset, Registry};
use console::style;

fn name_validator<'a>(
    registry: &'a Registry,
    current: Option<&str>,
) -> impl Fn(&str) -> Result<(), String> + 'a {
    let current = current.map(str::to_string);
    move |name: &str| {
        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        if current.as_deref() != Some(name) && registry.find_environment(name).is_some() {
            return Err(format!("An environment named '{name}' already exists"));
        }
        Ok(())
    }
}

fn pick_environment(registry: &Registry, prompt_text: &str) -> Result<Option<String>> {
    let items: Vec<String> = registry
        .environments
        .iter()
        .map(|env| format!("{} [{}]", env.name, env.kind))
        .collect();
    Ok(prompt::select(prompt_text, &items, 0)?
        .map(|idx| registry.environments[idx].name.clone()))
}

pub fn add(ctx: &Context) -> Result<()> {
    let mut registry = ctx.registry()?;
    output::heading("Add environment");

    let labels: Vec<String> = Preset::ALL.iter().map(|p| p.label().to_string()).collect();
    let Some(idx) = prompt::select("Provider", &labels, 0)? else {
        return Ok(());
    };
    let preset = Preset::ALL[idx];

    let Some(name) = prompt::input_validated("Name", name_validator(&registry, None))? else {
        return Ok(());
    };
    let Some(description) = prompt::input("Description (optional)", None, true)? else {
        return Ok(());
    };
    let Some(api_key) = prompt::secret(preset.api_key_field())? else {
        return Ok(());
    };
    let Some(base_url) = prompt::input("Base URL", Some(preset.default_base_url()), true)? else {
        return Ok(());
    };
    let Some(model) = prompt::input("Model", Some(preset.default_model()), true)? else {
        return Ok(());
    };

    let env = preset.build(
        &name,
        Some(&description),
        &api_key,
        Some(&base_url),
        Some(&model),
    );
    let kind = env.kind.clone();
    registry.add_environment(env)?;

    if ctx.save(&registry) {
        output::success(format!("Added environment {name}"));
        output::detail(format!("Type: {kind}"));
    }
    Ok(())
}

pub fn view(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    output::heading("Environments");

    if registry.environments.is_empty() {
        output::warning("No environments configured");
        return Ok(());
    }

    let mut table = create_table(vec!["#", "Name", "Type", "Description", "Key", "Base URL", "Model"]);
    for (i, env) in registry.environments.iter().enumerate() {
        let mut name = env.name.clone();
        if registry.active_environment.as_deref() == Some(env.name.as_str()) {
            name.push_str(" ✓");
        }
        table.add_row(vec![
            (i + 1).to_string(),
            name,
            env.kind.to_string(),
            output::or_dash(env.description.as_deref()),
            env.credential().map(mask_secret).unwrap_or_else(|| "-".into()),
            output::or_dash(env.base_url()),
            output::or_dash(env.model()),
        ]);
    }
    println!("{table}");
    prompt::pause();
    Ok(())
}

/// Ask for a new value of `key`; an empty answer removes the field
fn edit_field(env: &mut Environment, label: &str, key: &str) -> Result<bool> {
    let current = env.field_str(key).map(str::to_string);
    let Some(value) = prompt::input(label, current.as_deref(), true)? else {
        return Ok(false);
    };
    if value.is_empty() {
        env.remove_field(key);
    } else {
        env.set_field(key, value);
    }
    Ok(true)
}

pub fn edit(ctx: &Context) -> Result<()> {
    let mut registry = ctx.registry()?;
    if registry.environments.is_empty() {
        output::warning("No environments to edit");
        return Ok(());
    }
    let Some(original) = pick_environment(&registry, "Edit which environment?")? else {
        return Ok(());
    };
    let Some(mut env) = registry.find_environment(&original).cloned() else {
        return Ok(());
    };

    output::heading(format!("Editing {original}"));
    let Some(name) = prompt::input_validated("Name", name_validator(&registry, Some(&original)))?
    else {
        return Ok(());
    };
    env.name = name;

    let Some(description) =
        prompt::input("Description", env.description.as_deref(), true)?
    else {
        return Ok(());
    };
    env.description = (!description.is_empty()).then_some(description);

    if let Some(names) = env.kind.field_names() {
        let credential_key = match names.auth_token {
            Some(token) if env.field_str(names.api_key).is_none() && env.field_str(token).is_some() => token,
            _ => names.api_key,
        };
        for (label, key) in [
            (credential_key, credential_key),
            ("Base URL", names.base_url),
            ("Model", names.model),
        ] {
            if !edit_field(&mut env, label, key)? {
                return Ok(());
            }
        }
        if let Some(small_fast) = names.small_fast_model {
            if !edit_field(&mut env, "Small/fast model", small_fast)? {
                return Ok(());
            }
        }
    }

    let renamed = env.name != original;
    let new_name = env.name.clone();
    registry.update_environment(&original, env)?;
    if renamed && registry.active_environment.as_deref() == Some(original.as_str()) {
        registry.active_environment = Some(new_name.clone());
    }

    if ctx.save(&registry) {
        output::success(format!("Updated environment {new_name}"));
    }
    Ok(())
}

pub fn delete(ctx: &Context) -> Result<()> {
    let mut registry = ctx.registry()?;
    if registry.environments.is_empty() {
        output::warning("No environments to delete");
        return Ok(());
    }
    let Some(name) = pick_environment(&registry, "Delete which environment?")? else {
        return Ok(());
    };

    let question = format!("Delete environment '{}'?", style(&name).bold());
    match prompt::confirm(&question, false)? {
        Some(true) => {}
        Some(false) => {
            println!("{}", style("Deletion cancelled").dim());
            return Ok(());
        }
        None => return Ok(()),
    }

    registry.remove_environment(&name)?;
    if ctx.save(&registry) {
        output::success(format!("Deleted environment {name}"));
    }
    Ok(())
}
