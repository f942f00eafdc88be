//! Minimal reader/writer for the Codex `config.toml` subset
//!
//! Supported on read:
//! - blank lines and `#` comments
//! - `key = value` at the top level or inside a table; dotted keys such as
//!   `tools.web_search = true` nest the way TOML nests them
//! - `[a.b]` headers and `[[a.b]]` arrays of tables, with quoted segments
//! - values: strings (multi-line `"""`/`'''` strings too), booleans, numbers,
//!   arrays (may span lines) and inline tables
//!
//! Reading never fails on content. Lines it cannot make sense of are skipped.
//! Writing is deterministic and drops comments and original formatting, but
//! every key it read keeps its meaning.

use crate::config::write_text_file;
use crate::error::{CoreError, Result};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

pub type Document = Map<String, Value>;

pub const MCP_SERVERS_KEY: &str = "mcp_servers";

const BASIC_MULTI_LINE: &str = "\"\"\"";
const LITERAL_MULTI_LINE: &str = "'''";

#[derive(Debug, Clone, PartialEq)]
enum Section {
    /// Key path of the current table; empty at the top level
    Table(Vec<String>),
    /// Malformed header; contents are skipped
    Unsupported,
}

/// Read a document from disk; a missing file is an empty document
pub fn read_file(path: &Path) -> Result<Document> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
        Err(e) => Err(CoreError::io(path, e)),
    }
}

pub fn write_file(path: &Path, doc: &Document) -> Result<()> {
    write_text_file(path, &render(doc))
}

pub fn parse(content: &str) -> Document {
    let mut doc = Document::new();
    let mut section = Section::Table(Vec::new());
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if trimmed.starts_with('[') {
            section = open_section(&mut doc, trimmed);
            continue;
        }

        let Some((raw_key, raw_value)) = trimmed.split_once('=') else {
            continue;
        };
        let key_path = split_dotted(raw_key.trim());
        let Some((key, parents)) = key_path.split_last() else {
            continue;
        };
        if key_path.iter().any(String::is_empty) {
            continue;
        }

        let mut raw_value = raw_value.trim().to_string();
        if let Some(delim) = multi_line_delimiter(&raw_value) {
            // Body lines are kept verbatim, `=` and all
            while !raw_value[delim.len()..].contains(delim) {
                match lines.next() {
                    Some(next) => {
                        raw_value.push('\n');
                        raw_value.push_str(next);
                    }
                    None => break,
                }
            }
        } else {
            // Arrays may continue over several lines
            while bracket_depth(&raw_value) > 0 {
                match lines.next() {
                    Some(next) => {
                        raw_value.push(' ');
                        raw_value.push_str(next.trim());
                    }
                    None => break,
                }
            }
        }

        let Some(value) = decode_value(&raw_value) else {
            continue;
        };
        let Section::Table(table_path) = &section else {
            continue;
        };
        let mut full = table_path.clone();
        full.extend(parents.iter().cloned());
        if let Some(table) = table_at(&mut doc, &full) {
            table.insert(key.clone(), value);
        }
    }

    doc
}

fn multi_line_delimiter(raw: &str) -> Option<&'static str> {
    [BASIC_MULTI_LINE, LITERAL_MULTI_LINE]
        .into_iter()
        .find(|delim| raw.starts_with(delim))
}

/// Parse a header line and create the table it names
fn open_section(doc: &mut Document, line: &str) -> Section {
    let array = line.starts_with("[[");
    let (open, close) = if array { ("[[", "]]") } else { ("[", "]") };

    let Some(end) = line.rfind(close) else {
        return Section::Unsupported;
    };
    let trailing = line[end + close.len()..].trim();
    if !trailing.is_empty() && !trailing.starts_with('#') {
        return Section::Unsupported;
    }
    let name = match line.get(open.len()..end) {
        Some(name) if !name.trim().is_empty() => name.trim(),
        _ => return Section::Unsupported,
    };
    let path = split_dotted(name);
    if path.iter().any(String::is_empty) {
        return Section::Unsupported;
    }

    let opened = if array {
        push_table_array_item(doc, &path)
    } else {
        // Creating the table is enough; an empty `[mcp_servers.x]` still names a server
        table_at(doc, &path).map(|_| ())
    };
    match opened {
        Some(()) => Section::Table(path),
        None => Section::Unsupported,
    }
}

/// The table at `path`, created as needed.
///
/// An array of tables on the way resolves to its last element, as in TOML.
/// `None` if a scalar is in the way.
fn table_at<'a>(doc: &'a mut Document, path: &[String]) -> Option<&'a mut Document> {
    let mut current = doc;
    for key in path {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            Value::Array(items) => items.last_mut()?.as_object_mut()?,
            _ => return None,
        };
    }
    Some(current)
}

fn push_table_array_item(doc: &mut Document, path: &[String]) -> Option<()> {
    let (last, parents) = path.split_last()?;
    let parent = table_at(doc, parents)?;
    let slot = parent
        .entry(last.clone())
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(items) = slot else {
        return None;
    };
    items.push(Value::Object(Map::new()));
    Some(())
}

/// Split `a."b.c".d` into `["a", "b.c", "d"]`
fn split_dotted(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in name.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => quote = Some(ch),
            (None, '.') => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

/// Open `[` minus closing `]`, ignoring brackets inside strings
fn bracket_depth(s: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in s.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q == '"' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' => depth -= 1,
            '#' => break,
            _ => {}
        }
    }
    depth
}

fn decode_value(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(mut table) = toml::from_str::<toml::Table>(&format!("v = {raw}")) {
        if let Some(value) = table.remove("v") {
            return Some(toml_to_json(value));
        }
    }
    Some(decode_lenient(raw))
}

/// Best-effort decoding for values the TOML grammar rejects
fn decode_lenient(raw: &str) -> Value {
    if let Some(delim) = multi_line_delimiter(raw) {
        let body = &raw[delim.len()..];
        let body = body.strip_suffix(delim).unwrap_or(body);
        return Value::from(body.strip_prefix('\n').unwrap_or(body));
    }
    if raw.starts_with('[') && raw.ends_with(']') {
        let items = raw[1..raw.len() - 1]
            .split(',')
            .map(|item| strip_quotes(item.trim()))
            .filter(|item| !item.is_empty())
            .map(Value::from)
            .collect();
        return Value::Array(items);
    }
    match strip_quotes(raw).as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::from(other),
    }
}

fn strip_quotes(s: &str) -> String {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    let s = s.strip_suffix(['"', '\'']).unwrap_or(s);
    s.to_string()
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Serialize: top-level scalars, then one `[table]` or `[[table]]` block per
/// nested table, then one `[mcp_servers.<name>]` table per server
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    push_assignments(&mut out, doc, false);
    let has_scalars = !out.is_empty();

    let mut blocks = String::new();
    for (key, value) in doc {
        if key != MCP_SERVERS_KEY {
            push_block(&mut blocks, &[key.as_str()], value);
        }
    }
    match doc.get(MCP_SERVERS_KEY) {
        Some(Value::Object(servers)) => {
            for (name, server) in servers {
                let Value::Object(server) = server else {
                    continue;
                };
                // Server bodies stay flat; `env` renders as an inline table
                blocks.push_str(&header(&[MCP_SERVERS_KEY, name.as_str()], false));
                push_assignments(&mut blocks, server, true);
                blocks.push('\n');
            }
        }
        Some(other) => push_block(&mut blocks, &[MCP_SERVERS_KEY], other),
        None => {}
    }

    if has_scalars && !blocks.is_empty() {
        out.push('\n');
    }
    out.push_str(&blocks);
    out
}

/// Non-empty array whose items are all tables
fn is_table_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object))
}

fn is_block(value: &Value) -> bool {
    value.is_object() || is_table_array(value)
}

fn push_assignments(out: &mut String, table: &Map<String, Value>, inline_tables: bool) {
    for (key, value) in table {
        if inline_tables || !is_block(value) {
            push_assignment(out, key, value);
        }
    }
}

/// Emit `value` under `path` when it is a table or an array of tables
fn push_block(out: &mut String, path: &[&str], value: &Value) {
    match value {
        Value::Object(table) => {
            // A table holding only sub-tables needs no header of its own
            if table.is_empty() || table.values().any(|v| !is_block(v)) {
                out.push_str(&header(path, false));
                push_assignments(out, table, false);
                out.push('\n');
            }
            push_children(out, path, table);
        }
        Value::Array(items) if is_table_array(value) => {
            for item in items.iter().filter_map(Value::as_object) {
                out.push_str(&header(path, true));
                push_assignments(out, item, false);
                out.push('\n');
                push_children(out, path, item);
            }
        }
        _ => {}
    }
}

fn push_children(out: &mut String, path: &[&str], table: &Map<String, Value>) {
    for (key, child) in table {
        let mut child_path = path.to_vec();
        child_path.push(key.as_str());
        push_block(out, &child_path, child);
    }
}

fn header(path: &[&str], array: bool) -> String {
    let name = path
        .iter()
        .map(|key| render_key(key))
        .collect::<Vec<_>>()
        .join(".");
    if array {
        format!("[[{name}]]\n")
    } else {
        format!("[{name}]\n")
    }
}

fn push_assignment(out: &mut String, key: &str, value: &Value) {
    if let Some(rendered) = render_value(value) {
        out.push_str(&format!("{} = {}\n", render_key(key), rendered));
    }
}

/// TOML text for a value; `None` for null, which TOML cannot express
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(render_string(s)),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(render_value).collect();
            Some(format!("[{}]", items.join(", ")))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return Some("{}".to_string());
            }
            let pairs: Vec<String> = map
                .iter()
                .filter_map(|(k, v)| render_value(v).map(|v| format!("{} = {}", render_key(k), v)))
                .collect();
            Some(format!("{{ {} }}", pairs.join(", ")))
        }
    }
}

fn render_string(s: &str) -> String {
    let mut value = toml_edit::Value::from(s);
    value.decor_mut().clear();
    value.to_string()
}

fn render_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        render_string(key)
    }
}
