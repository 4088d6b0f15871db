use anyhow::{Context, Result};
use serde_json::Value;

use super::Formatter;

/// YAML encoding, optionally prefixed with a `---` document separator.
///
/// Trailing newlines from the encoder are trimmed so the pipeline controls
/// line termination.
pub struct YamlFormatter {
    separator: bool,
}

impl YamlFormatter {
    pub fn with_separator() -> Self {
        Self { separator: true }
    }

    pub fn without_separator() -> Self {
        Self { separator: false }
    }
}

impl Formatter for YamlFormatter {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        let text = serde_yaml::to_string(value).context("marshal yaml")?;
        let trimmed = text.trim_end_matches('\n');
        let out = if self.separator {
            format!("---\n{trimmed}")
        } else {
            trimmed.to_string()
        };
        Ok(out.into_bytes())
    }
}
