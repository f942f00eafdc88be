use super::{claude, codex, environments, gemini, mcp, Context};
use crate::update::UpdateCheck;
use crate::{editor, output, prompt};
use anyhow::Result;
use ccc_core::{CoreError, Scope};
use console::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ClaudeSwitch,
    ClaudePermissions,
    ClaudeView,
    ClaudeClear,
    GeminiKey,
    GeminiAutoAccept,
    CodexView,
    McpSelect,
    McpStatus,
    EnvAdd,
    EnvView,
    EnvEdit,
    EnvDelete,
    EditConfig,
    Exit,
}

const MENU: [(Action, &str); 15] = [
    (Action::ClaudeSwitch, "Claude  · Switch environment"),
    (Action::ClaudePermissions, "Claude  · Permission mode"),
    (Action::ClaudeView, "Claude  · View current settings"),
    (Action::ClaudeClear, "Claude  · Clear proxy configuration"),
    (Action::GeminiKey, "Gemini  · Set API key"),
    (Action::GeminiAutoAccept, "Gemini  · Auto-accept"),
    (Action::CodexView, "Codex   · View configuration"),
    (Action::McpSelect, "MCP     · Select servers"),
    (Action::McpStatus, "MCP     · Status"),
    (Action::EnvAdd, "Envs    · Add"),
    (Action::EnvView, "Envs    · View"),
    (Action::EnvEdit, "Envs    · Edit"),
    (Action::EnvDelete, "Envs    · Delete"),
    (Action::EditConfig, "Edit config file"),
    (Action::Exit, "Exit"),
];

fn banner(ctx: &Context) {
    println!(
        "{}",
        style(format!("claude-code-config v{}", env!("CARGO_PKG_VERSION")))
            .cyan()
            .bold()
    );
    match ctx.paths.scope() {
        Scope::Global => println!("{}", style("Global mode (Claude)").blue()),
        Scope::Project(root) => {
            println!("{}", style(format!("Project mode (Claude): {}", root.display())).blue())
        }
    }
    println!();
}

fn dispatch(ctx: &Context, action: Action) -> Result<()> {
    match action {
        Action::ClaudeSwitch => claude::switch(ctx),
        Action::ClaudePermissions => claude::permission_mode(ctx),
        Action::ClaudeView => claude::view(ctx),
        Action::ClaudeClear => claude::clear(ctx),
        Action::GeminiKey => gemini::set_api_key(ctx),
        Action::GeminiAutoAccept => gemini::auto_accept(ctx),
        Action::CodexView => codex::view(ctx),
        Action::McpSelect => mcp::select_servers(ctx),
        Action::McpStatus => mcp::status(ctx),
        Action::EnvAdd => environments::add(ctx),
        Action::EnvView => environments::view(ctx),
        Action::EnvEdit => environments::edit(ctx),
        Action::EnvDelete => environments::delete(ctx),
        Action::EditConfig => {
            let registry = ctx.registry()?;
            editor::open(registry.editor.as_deref(), ctx.store.path())
        }
        Action::Exit => Ok(()),
    }
}

/// A corrupt registry ends the session; everything else returns to the menu
fn is_fatal(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::ConfigCorrupt { .. })
    )
}

pub fn run(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    banner(ctx);
    let mut update = UpdateCheck::start(&registry);

    let labels: Vec<String> = MENU.iter().map(|(_, label)| label.to_string()).collect();
    let mut last = 0;

    loop {
        update.poll(ctx);

        let Some(idx) = prompt::select("What would you like to do?", &labels, last)? else {
            println!("{}", style("Goodbye!").dim());
            return Ok(());
        };
        last = idx;

        let action = MENU[idx].0;
        if action == Action::Exit {
            println!("{}", style("Goodbye!").dim());
            return Ok(());
        }

        if let Err(e) = dispatch(ctx, action) {
            if is_fatal(&e) {
                return Err(e);
            }
            log::error!("{action:?} failed: {e:#}");
            output::failure(format!("{e:#}"));
        }
        println!();
    }
}
