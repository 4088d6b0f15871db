// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Output formatters.
//!
//! A formatter turns one structured value into bytes; framing (the newline
//! after each main-channel item) is the pipeline's job, so no formatter
//! emits a trailing newline.

mod json;
mod pretty;
mod yaml;

pub use json::{CompactJson, IndentedJson};
pub use pretty::PrettyJson;
pub use yaml::YamlFormatter;

use anyhow::Result;
use serde_json::Value;

pub trait Formatter {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>>;
}

/// The supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented JSON, 4-space indent.
    Json,
    /// JSON without whitespace.
    JsonCompact,
    /// Indented JSON with ANSI colors.
    JsonPretty,
    /// YAML with a leading `---` document separator.
    Yaml,
    /// YAML without the separator.
    YamlNoSep,
}

impl OutputFormat {
    /// Map a selector string to a format. Total: unknown or empty selectors
    /// fall back to indented JSON rather than failing.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "json" => OutputFormat::Json,
            "jsoncompact" => OutputFormat::JsonCompact,
            "jsonpretty" => OutputFormat::JsonPretty,
            "yaml" => OutputFormat::Yaml,
            "yamlnosep" => OutputFormat::YamlNoSep,
            _ => OutputFormat::Json,
        }
    }

    pub fn formatter(&self) -> Box<dyn Formatter> {
        match self {
            OutputFormat::Json => Box::new(IndentedJson),
            OutputFormat::JsonCompact => Box::new(CompactJson),
            OutputFormat::JsonPretty => Box::new(PrettyJson::default()),
            OutputFormat::Yaml => Box::new(YamlFormatter::with_separator()),
            OutputFormat::YamlNoSep => Box::new(YamlFormatter::without_separator()),
        }
    }
}
