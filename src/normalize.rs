// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Object normalization.
//!
//! Fetched objects are round-tripped through their JSON wire form into a
//! generic ordered mapping, so the jq program sees each resource exactly
//! as it would appear in `kubectl get -o json` output.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Convert a fetched object into a generic structured value.
///
/// Fails if the object cannot be serialized, or if its serialized form is
/// not a JSON mapping.
pub fn normalize<T: Serialize>(object: &T) -> Result<Value> {
    let bytes = serde_json::to_vec(object).context("convert object to json")?;
    let fields: serde_json::Map<String, Value> =
        serde_json::from_slice(&bytes).context("convert object to generic mapping")?;
    Ok(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_mapping() {
        let value = normalize(&json!({"kind": "Pod", "metadata": {"name": "x"}})).unwrap();
        assert_eq!(value, json!({"kind": "Pod", "metadata": {"name": "x"}}));
    }

    #[test]
    fn test_normalize_preserves_key_order() {
        let value = normalize(&json!({"zeta": 1, "alpha": 2})).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_normalize_rejects_non_mapping() {
        assert!(normalize(&json!("just a string")).is_err());
        assert!(normalize(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_normalize_struct() {
        #[derive(Serialize)]
        struct Meta {
            name: String,
        }
        #[derive(Serialize)]
        struct Obj {
            metadata: Meta,
        }
        let obj = Obj {
            metadata: Meta { name: "x".into() },
        };
        let value = normalize(&obj).unwrap();
        assert_eq!(value, json!({"metadata": {"name": "x"}}));
    }
}
