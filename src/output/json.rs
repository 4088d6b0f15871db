use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::Formatter;

/// JSON without whitespace. Also used for the diagnostic channel,
/// regardless of the configured main-channel format.
pub struct CompactJson;

impl Formatter for CompactJson {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).context("marshal compact json")
    }
}

/// JSON with a fixed 4-space indent.
pub struct IndentedJson;

impl Formatter for IndentedJson {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let indent = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, indent);
        value.serialize(&mut ser).context("marshal indented json")?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_has_no_whitespace() {
        let bytes = CompactJson.marshal(&json!({"a": [1, 2], "b": "x"})).unwrap();
        assert_eq!(bytes, br#"{"a":[1,2],"b":"x"}"#);
    }

    #[test]
    fn test_indented_uses_four_spaces() {
        let bytes = IndentedJson.marshal(&json!({"a": {"b": 1}})).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}");
    }

    #[test]
    fn test_no_trailing_newline() {
        for formatter in [&CompactJson as &dyn Formatter, &IndentedJson] {
            let bytes = formatter.marshal(&json!([1])).unwrap();
            assert!(!bytes.ends_with(b"\n"));
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(CompactJson.marshal(&json!("x")).unwrap(), br#""x""#);
        assert_eq!(IndentedJson.marshal(&json!(42)).unwrap(), b"42");
        assert_eq!(IndentedJson.marshal(&json!(null)).unwrap(), b"null");
    }
}
