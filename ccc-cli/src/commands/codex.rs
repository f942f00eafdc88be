use super::Context;
use crate::output::{self, create_table};
use anyhow::Result;
use ccc_core::codex::{codex_status, CodexTransport};

pub fn view(ctx: &Context) -> Result<()> {
    let path = ctx.paths.codex_config_path();
    let status = codex_status(&path)?;

    output::heading("Codex configuration");
    output::detail(format!("File: {}", path.display()));
    if !status.exists {
        output::warning("config.toml does not exist yet");
        return Ok(());
    }

    println!(
        "  experimental_use_rmcp_client: {}",
        if status.rmcp_client { "true" } else { "false" }
    );

    if status.servers.is_empty() {
        println!("  No MCP servers configured");
        return Ok(());
    }

    let mut table = create_table(vec!["Server", "Transport", "Target"]);
    for server in &status.servers {
        let (transport, target) = match &server.transport {
            CodexTransport::Http { url } => ("http", url.as_str()),
            CodexTransport::Stdio { command_line } => ("stdio", command_line.as_str()),
        };
        table.add_row(vec![server.name.as_str(), transport, target]);
    }
    println!("{table}");
    Ok(())
}
