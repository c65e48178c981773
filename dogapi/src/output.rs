//! Output formatting: plain text (human-readable) and JSON.

use dogapi_lib::RateLimit;
use serde_json::Value;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented key-value listing
    #[default]
    Plain,
    /// JSON (pretty-printed)
    Json,
}

pub fn print(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", format_plain(value)),
        OutputFormat::Json => println!("{}", format_json(value)),
    }
}

pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Objects become `key: value` lines, arrays become `- item` lines; nesting indents.
pub fn format_plain(value: &Value) -> String {
    let mut out = String::new();
    write_plain(value, &mut out, 0);
    out
}

fn write_plain(v: &Value, out: &mut String, indent: usize) {
    let pad = "  ".repeat(indent);
    match v {
        Value::Object(map) if map.is_empty() => {
            let _ = writeln!(out, "{}<empty>", pad);
        }
        Value::Object(map) => {
            for (key, val) in map {
                match scalar(val) {
                    Some(s) => {
                        let _ = writeln!(out, "{}{}: {}", pad, key, s);
                    }
                    None => {
                        let _ = writeln!(out, "{}{}:", pad, key);
                        write_plain(val, out, indent + 1);
                    }
                }
            }
        }
        Value::Array(items) if items.is_empty() => {
            let _ = writeln!(out, "{}<empty>", pad);
        }
        Value::Array(items) => {
            for item in items {
                match scalar(item) {
                    Some(s) => {
                        let _ = writeln!(out, "{}- {}", pad, s);
                    }
                    None => {
                        let _ = writeln!(out, "{}-", pad);
                        write_plain(item, out, indent + 1);
                    }
                }
            }
        }
        other => {
            let _ = writeln!(out, "{}{}", pad, scalar(other).unwrap_or_default());
        }
    }
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn format_rate_limit(rl: &RateLimit) -> String {
    let field = |v: Option<u64>| v.map_or_else(|| "?".to_string(), |n| n.to_string());
    format!(
        "rate limit{}: {}/{} remaining, period {}s, resets in {}s",
        rl.name
            .as_deref()
            .map(|n| format!(" ({})", n))
            .unwrap_or_default(),
        field(rl.remaining),
        field(rl.limit),
        field(rl.period),
        field(rl.reset),
    )
}
