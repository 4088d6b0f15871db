// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Adapter around the jaq jq engine.
//!
//! A program is compiled exactly once per run and re-executed per object.
//! Each item of the engine's lazy output sequence is translated into an
//! [`Emitted`] variant at this boundary, so the rest of the pipeline
//! dispatches on an explicit enum instead of inspecting value shapes.

mod convert;

use anyhow::{Result, anyhow};
use jaq_core::{Ctx, RcIter, compile, load};
use jaq_json::Val;
use serde_json::Value;

/// Marker that routes the unwrapped payload to the diagnostic channel.
const STDERR_MARKER: &str = "STDERR:";
/// Marker that routes the whole pair to the diagnostic channel.
const DEBUG_MARKER: &str = "DEBUG:";

type Filter = jaq_core::Filter<jaq_core::Native<Val>>;

/// One item emitted by running a program against one input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    /// Ordinary output value for the main channel.
    Value(Value),
    /// Out-of-band value for the diagnostic channel.
    Diagnostic(Value),
    /// Evaluation error raised by the expression for this input.
    Error(String),
}

/// A compiled, reusable jq program. Carries no state between runs.
pub struct Program {
    filter: Filter,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program").finish_non_exhaustive()
    }
}

/// Parse and compile a jq expression against the standard library.
pub fn compile(expr: &str) -> Result<Program> {
    let arena = load::Arena::default();
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));

    let path = ();
    let modules = loader
        .load(&arena, load::File { path, code: expr })
        .map_err(|errs| {
            let messages: Vec<String> = errs
                .into_iter()
                .flat_map(|(_, err)| -> Vec<String> {
                    match err {
                        load::Error::Io(errs) => {
                            errs.into_iter().map(|(_, msg)| msg).collect()
                        }
                        load::Error::Lex(errs) => errs
                            .into_iter()
                            .map(|(expected, _)| format!("expected {}", expected.as_str()))
                            .collect(),
                        load::Error::Parse(errs) => errs
                            .into_iter()
                            .map(|(expected, _)| format!("expected {}", expected.as_str()))
                            .collect(),
                    }
                })
                .collect();
            anyhow!("invalid jq expression: {}", messages.join(", "))
        })?;

    let filter = compile::Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let messages: Vec<String> = errs
                .into_iter()
                .flat_map(|(_, errs)| {
                    errs.into_iter()
                        .map(|(_, undefined)| format!("undefined {}", undefined.as_str()))
                })
                .collect();
            anyhow!("invalid jq expression: {}", messages.join(", "))
        })?;

    Ok(Program { filter })
}

impl Program {
    /// Run the program against one input value, handing every emitted item
    /// to `emit` strictly in emission order. The first error returned by
    /// `emit` stops iteration and propagates, leaving the remainder of the
    /// sequence unconsumed.
    pub fn run_with<F>(&self, input: Value, mut emit: F) -> Result<()>
    where
        F: FnMut(Emitted) -> Result<()>,
    {
        let inputs: RcIter<_> = RcIter::new(Box::new(core::iter::empty()));
        let ctx = Ctx::new(Vec::new(), &inputs);

        for result in self.filter.run((ctx, convert::json_to_val(input))) {
            let item = match result {
                Ok(val) => classify(val),
                Err(e) => Emitted::Error(e.to_string()),
            };
            emit(item)?;
        }
        Ok(())
    }
}

/// Translate one engine output value into an [`Emitted`] variant.
///
/// The engine convention for side-channel output is a 2-element array
/// whose first element is a sentinel marker string: "STDERR:" means emit
/// the raw payload, "DEBUG:" means emit the whole tagged pair. Any other
/// 2-element array is ordinary data and stays on the main channel.
fn classify(val: Val) -> Emitted {
    if let Val::Arr(pair) = &val
        && pair.len() == 2
        && let Val::Str(marker) = &pair[0]
    {
        match marker.as_str() {
            STDERR_MARKER => return Emitted::Diagnostic(convert::val_to_json(&pair[1])),
            DEBUG_MARKER => return Emitted::Diagnostic(convert::val_to_json(&val)),
            _ => {}
        }
    }
    Emitted::Value(convert::val_to_json(&val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_collect(expr: &str, input: Value) -> Vec<Emitted> {
        let program = compile(expr).unwrap();
        let mut items = Vec::new();
        program
            .run_with(input, |item| {
                items.push(item);
                Ok(())
            })
            .unwrap();
        items
    }

    #[test]
    fn test_compile_rejects_bad_syntax() {
        assert!(compile(".foo[").is_err());
        assert!(compile("if . then").is_err());
    }

    #[test]
    fn test_compile_rejects_undefined_filter() {
        let err = compile("no_such_filter").unwrap_err();
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn test_identity() {
        let items = run_collect(".", json!({"a": 1}));
        assert_eq!(items, vec![Emitted::Value(json!({"a": 1}))]);
    }

    #[test]
    fn test_emission_order() {
        let items = run_collect(".a, .b, .c", json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(
            items,
            vec![
                Emitted::Value(json!(1)),
                Emitted::Value(json!(2)),
                Emitted::Value(json!(3)),
            ]
        );
    }

    #[test]
    fn test_empty_emits_nothing() {
        assert!(run_collect("empty", json!({})).is_empty());
    }

    #[test]
    fn test_missing_field_emits_null() {
        let items = run_collect(".nope", json!({"a": 1}));
        assert_eq!(items, vec![Emitted::Value(Value::Null)]);
    }

    #[test]
    fn test_nested_iteration_order() {
        let pod = json!({
            "spec": {
                "containers": [
                    {"ports": [{"containerPort": 80}]},
                    {"ports": [{"containerPort": 443}, {"containerPort": 8080}]},
                ]
            }
        });
        let items = run_collect(".spec.containers[].ports[]", pod);
        assert_eq!(
            items,
            vec![
                Emitted::Value(json!({"containerPort": 80})),
                Emitted::Value(json!({"containerPort": 443})),
                Emitted::Value(json!({"containerPort": 8080})),
            ]
        );
    }

    #[test]
    fn test_error_is_classified() {
        let items = run_collect(r#"1, error("boom")"#, json!({}));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Emitted::Value(json!(1)));
        match &items[1] {
            Emitted::Error(msg) => assert!(msg.contains("boom")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_stderr_marker_unwraps_payload() {
        let items = run_collect(r#"["STDERR:", {"x": 1}]"#, json!({}));
        assert_eq!(items, vec![Emitted::Diagnostic(json!({"x": 1}))]);
    }

    #[test]
    fn test_debug_marker_keeps_pair() {
        let items = run_collect(r#"["DEBUG:", 42]"#, json!({}));
        assert_eq!(items, vec![Emitted::Diagnostic(json!(["DEBUG:", 42]))]);
    }

    #[test]
    fn test_plain_pair_stays_on_main_channel() {
        let items = run_collect(r#"["foo", 1]"#, json!({}));
        assert_eq!(items, vec![Emitted::Value(json!(["foo", 1]))]);
    }

    #[test]
    fn test_program_is_reusable_across_inputs() {
        let program = compile(".n").unwrap();
        for n in 0..3 {
            let mut items = Vec::new();
            program
                .run_with(json!({"n": n}), |item| {
                    items.push(item);
                    Ok(())
                })
                .unwrap();
            assert_eq!(items, vec![Emitted::Value(json!(n))]);
        }
    }

    #[test]
    fn test_emit_error_stops_iteration() {
        let program = compile("1, 2, 3").unwrap();
        let mut seen = 0;
        let result = program.run_with(json!(null), |_| {
            seen += 1;
            if seen == 2 {
                anyhow::bail!("stop")
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(seen, 2);
    }
}
