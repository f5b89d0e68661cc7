//! CLI output formatting: highlighted JSON, tables and error lines.

use std::fmt::Write as _;

use colored::Colorize;

/// Renders `value` as indented JSON with colored keys and scalars.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
#[must_use]
pub fn highlight_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

/// Prints [`highlight_json`] output followed by a newline.
pub fn print_highlighted_json(value: &serde_json::Value) {
    println!("{}", highlight_json(value));
}

fn write_value(out: &mut String, value: &serde_json::Value, depth: usize) {
    use serde_json::Value;

    match value {
        Value::Null => out.push_str(&"null".magenta().to_string()),
        Value::Bool(b) => out.push_str(&b.to_string().magenta().to_string()),
        Value::Number(n) => out.push_str(&n.to_string().yellow().to_string()),
        Value::String(s) => out.push_str(&quote(s).green().to_string()),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                separator(out, i, depth + 1);
                write_value(out, item, depth + 1);
            }
            newline(out, depth);
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                separator(out, i, depth + 1);
                let _ = write!(out, "{}: ", quote(key).cyan());
                write_value(out, item, depth + 1);
            }
            newline(out, depth);
            out.push('}');
        }
    }
}

fn separator(out: &mut String, index: usize, depth: usize) {
    if index > 0 {
        out.push(',');
    }
    newline(out, depth);
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    out.push_str(&"  ".repeat(depth));
}

fn quote(s: &str) -> String { serde_json::Value::String(s.to_owned()).to_string() }

/// Formats an error line for stderr.
#[must_use]
pub fn format_error(message: &str) -> String { format!("{} {message}", "tessera:".red().bold()) }
