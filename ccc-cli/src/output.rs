use comfy_table::{presets, Table};
use console::style;
use std::fmt::Display;

pub fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(headers);
    table
}

pub fn heading(text: impl Display) {
    println!("\n{}\n", style(text).cyan().bold());
}

pub fn success(text: impl Display) {
    println!("{} {}", style("✓").green(), style(text).green());
}

pub fn warning(text: impl Display) {
    println!("{} {}", style("⚠").yellow(), style(text).yellow());
}

pub fn failure(text: impl Display) {
    println!("{} {}", style("✗").red(), style(text).red());
}

pub fn detail(text: impl Display) {
    println!("  {}", style(text).dim());
}

/// `-` for absent cells
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
