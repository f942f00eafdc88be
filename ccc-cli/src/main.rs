use anyhow::Context as _;
use ccc_core::{ConfigPaths, CoreError, Scope};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::{self, Command};

mod commands;
mod editor;
mod output;
mod prompt;
mod update;

#[derive(Parser)]
#[command(name = "ccc")]
#[command(author, about = "Switch Claude, Gemini and Codex profiles and MCP servers", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project directory to manage (same as --project PATH)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Manage a project's .claude/settings.json (current directory if PATH is omitted; pass it as --project=PATH)
    #[arg(
        short,
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "."
    )]
    project: Option<PathBuf>,

    /// Print version information
    #[arg(short = 'v', long)]
    version: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Select active MCP servers
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if cli.version {
        print_version();
        return;
    }

    if let Err(e) = run(cli) {
        if let Some(CoreError::ConfigCorrupt { path, .. }) = e.downcast_ref::<CoreError>() {
            eprintln!("{} {e}", style("Error:").red().bold());
            eprintln!("Fix or remove {} and try again.", path.display());
        } else {
            eprintln!("{} {e:#}", style("Error:").red().bold());
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let scope = resolve_scope(&cli)?;
    let paths = ConfigPaths::resolve(scope)?;
    let ctx = commands::Context::new(paths);

    match cli.command {
        Some(Commands::Mcp) => {
            ctx.registry()?;
            commands::mcp::select_servers(&ctx)
        }
        None => commands::menu::run(&ctx),
    }
}

fn resolve_scope(cli: &Cli) -> anyhow::Result<Scope> {
    let Some(dir) = cli.project.as_ref().or(cli.path.as_ref()) else {
        return Ok(Scope::Global);
    };
    let root = std::path::absolute(dir)
        .with_context(|| format!("Invalid project path {}", dir.display()))?;
    log::debug!("project scope at {}", root.display());
    Ok(Scope::Project(root))
}

fn print_version() {
    println!("claude-code-config: {}", env!("CARGO_PKG_VERSION"));

    let claude = which::which("claude")
        .ok()
        .and_then(|bin| Command::new(bin).arg("-v").output().ok())
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());
    match claude {
        Some(version) => println!("claude: {version}"),
        None => println!("{}", style("claude: Not Found").red()),
    }
}
