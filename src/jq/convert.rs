//! Conversions between `serde_json::Value` and the jaq value type.

use std::rc::Rc;

use jaq_json::Val;
use serde_json::Value;

/// Convert a generic JSON value into a jaq input value.
pub fn json_to_val(value: Value) -> Val {
    match value {
        Value::Null => Val::Null,
        Value::Bool(b) => Val::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64()
                && let Ok(i) = isize::try_from(i)
            {
                Val::Int(i)
            } else if let Some(f) = n.as_f64() {
                Val::Float(f)
            } else {
                // Arbitrary-precision literal, keep the textual form
                Val::Num(Rc::new(n.to_string()))
            }
        }
        Value::String(s) => Val::Str(Rc::new(s)),
        Value::Array(items) => Val::Arr(Rc::new(items.into_iter().map(json_to_val).collect())),
        Value::Object(fields) => Val::obj(
            fields
                .into_iter()
                .map(|(k, v)| (Rc::new(k), json_to_val(v)))
                .collect(),
        ),
    }
}

/// Convert a jaq output value back into a generic JSON value.
pub fn val_to_json(val: &Val) -> Value {
    match val {
        Val::Null => Value::Null,
        Val::Bool(b) => Value::Bool(*b),
        Val::Int(i) => Value::Number((*i as i64).into()),
        Val::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Val::Num(n) => serde_json::from_str(n).unwrap_or_else(|_| Value::String(n.to_string())),
        Val::Str(s) => Value::String(s.to_string()),
        Val::Arr(items) => Value::Array(items.iter().map(val_to_json).collect()),
        Val::Obj(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), val_to_json(v)))
                .collect(),
        ),
    }
}
