use super::Context;
use crate::output::{self, create_table};
use crate::prompt;
use anyhow::Result;
use ccc_core::mcp::{mcp_status, TargetStatus};
use ccc_core::{ApplyOutcome, McpSelector};
use console::style;

pub fn select_servers(ctx: &Context) -> Result<()> {
    let mut registry = ctx.registry()?;
    if registry.mcp_servers.is_empty() {
        output::warning(format!(
            "No MCP servers defined in {}",
            ctx.store.path().display()
        ));
        return Ok(());
    }

    let names: Vec<String> = registry.mcp_servers.keys().cloned().collect();
    let items: Vec<String> = registry
        .mcp_servers
        .iter()
        .map(|(name, def)| format!("{name} ({})", def.transport()))
        .collect();
    let checked: Vec<bool> = names.iter().map(|n| registry.is_mcp_active(n)).collect();

    let Some(picked) = prompt::multi_select(
        "Active MCP servers (space to toggle, enter to apply)",
        &items,
        &checked,
    )?
    else {
        return Ok(());
    };

    registry.set_active_mcp_servers(picked.into_iter().map(|i| names[i].clone()));
    if !ctx.save(&registry) {
        return Ok(());
    }

    if registry.active_mcp_servers.is_empty() {
        output::warning("No active MCP servers; removing MCP configuration from every tool.");
    }

    let results = McpSelector::new(&ctx.paths).apply_active(&registry);
    report(&results);
    Ok(())
}

fn report(results: &[TargetStatus]) {
    for status in results {
        let path = status.path.display();
        match &status.outcome {
            ApplyOutcome::Written { servers } => output::success(format!(
                "{}: wrote {servers} server(s) to {path}",
                status.target
            )),
            ApplyOutcome::Cleared => {
                output::success(format!("{}: removed MCP servers from {path}", status.target))
            }
            ApplyOutcome::Unchanged => {
                output::detail(format!("{}: nothing to remove in {path}", status.target))
            }
            ApplyOutcome::Failed(reason) => {
                output::failure(format!("{}: {reason}", status.target))
            }
        }
    }

    let failed = results.iter().filter(|s| !s.is_ok()).count();
    if failed > 0 {
        output::warning(format!(
            "{failed} target(s) were not updated; the others were written."
        ));
    }
}

pub fn status(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;

    output::heading("MCP servers");
    if registry.active_mcp_servers.is_empty() {
        println!("  Active: {}", style("none").dim());
    } else {
        println!("  Active: {}", registry.active_mcp_servers.join(", "));
    }
    println!();

    let mut table = create_table(vec!["Tool", "File", "Servers"]);
    for target in mcp_status(&ctx.paths) {
        let servers = match (&target.error, target.exists) {
            (Some(err), _) => format!("error: {err}"),
            (None, false) => "(file missing)".to_string(),
            (None, true) if target.servers.is_empty() => "-".to_string(),
            (None, true) => target.servers.join(", "),
        };
        table.add_row(vec![
            target.target.to_string(),
            target.path.display().to_string(),
            servers,
        ]);
    }
    println!("{table}");
    Ok(())
}
