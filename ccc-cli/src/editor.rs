use crate::output;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

const FALLBACK_EDITORS: [&str; 2] = ["cursor", "code"];

/// Open `path` in the preferred editor, falling back to Cursor then VS Code.
///
/// The editor is detached; we never wait for it.
pub fn open(preferred: Option<&str>, path: &Path) -> Result<()> {
    let candidates = preferred
        .filter(|e| !e.trim().is_empty())
        .into_iter()
        .chain(FALLBACK_EDITORS);

    for editor in candidates {
        let mut parts = editor.split_whitespace();
        let Some(program) = parts.next() else {
            continue;
        };
        let resolved = match which::which(program) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::debug!("editor {program} not usable: {e}");
                continue;
            }
        };

        println!("Opening config with {editor}...");
        Command::new(resolved)
            .args(parts)
            .arg(path)
            .spawn()
            .with_context(|| format!("Failed to launch {editor}"))?;
        output::success(format!("Opened {} in {editor}", path.display()));
        return Ok(());
    }

    output::warning("No editor found (tried cursor and code)");
    output::detail(format!("Config file: {}", path.display()));
    output::detail("Open it with any text editor to make changes.");
    Ok(())
}
