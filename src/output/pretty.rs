// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Context, Result};
use console::Style;
use serde_json::Value;

use super::Formatter;

const INDENT: usize = 4;

/// Indented JSON annotated with ANSI colors per value kind.
///
/// Color application follows console's process-wide color state, so piped
/// output degrades to plain indented JSON with identical value bytes.
pub struct PrettyJson {
    key: Style,
    string: Style,
    boolean: Style,
    number: Style,
    null: Style,
}

impl Default for PrettyJson {
    fn default() -> Self {
        Self {
            key: Style::new().blue().bold(),
            string: Style::new().green(),
            boolean: Style::new().yellow(),
            number: Style::new().cyan(),
            null: Style::new().black().bright(),
        }
    }
}

impl Formatter for PrettyJson {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = String::new();
        self.write_value(value, 0, &mut out)?;
        Ok(out.into_bytes())
    }
}

impl PrettyJson {
    fn write_value(&self, value: &Value, depth: usize, out: &mut String) -> Result<()> {
        match value {
            Value::Null => out.push_str(&self.null.apply_to("null").to_string()),
            Value::Bool(b) => out.push_str(&self.boolean.apply_to(b).to_string()),
            Value::Number(n) => out.push_str(&self.number.apply_to(n).to_string()),
            Value::String(s) => {
                let quoted = serde_json::to_string(s).context("marshal string")?;
                out.push_str(&self.string.apply_to(quoted).to_string());
            }
            Value::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return Ok(());
                }
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pad(out, depth + 1);
                    self.write_value(item, depth + 1, out)?;
                }
                out.push('\n');
                pad(out, depth);
                out.push(']');
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    out.push_str("{}");
                    return Ok(());
                }
                out.push_str("{\n");
                for (i, (key, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pad(out, depth + 1);
                    let quoted = serde_json::to_string(key).context("marshal key")?;
                    out.push_str(&self.key.apply_to(quoted).to_string());
                    out.push_str(": ");
                    self.write_value(item, depth + 1, out)?;
                }
                out.push('\n');
                pad(out, depth);
                out.push('}');
            }
        }
        Ok(())
    }
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth * INDENT {
        out.push(' ');
    }
}
