// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The evaluation and streaming pipeline.
//!
//! One object at a time, the compiled jq program is run against the
//! normalized value and every emitted item is written before the next
//! object is touched. Main-channel values go to `out` framed with one
//! newline each; diagnostics go to `diag` as compact JSON with no framing.
//! Within each channel the emission order is preserved; across the two
//! channels no interleaving order is guaranteed since they are distinct
//! streams.

use std::fmt;
use std::io::Write;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::jq::{Emitted, Program};
use crate::output::{CompactJson, Formatter};

/// Identity of the object currently being evaluated, for error attribution.
#[derive(Debug, Clone, Default)]
pub struct ObjectIdent {
    pub namespace: String,
    pub name: String,
}

impl ObjectIdent {
    pub fn new(namespace: String, name: String) -> Self {
        Self { namespace, name }
    }
}

impl fmt::Display for ObjectIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

pub struct Pipeline<W, E> {
    out: W,
    diag: E,
    formatter: Box<dyn Formatter>,
    raw_strings: bool,
}

impl<W: Write, E: Write> Pipeline<W, E> {
    pub fn new(out: W, diag: E, formatter: Box<dyn Formatter>, raw_strings: bool) -> Self {
        Self {
            out,
            diag,
            formatter,
            raw_strings,
        }
    }

    /// Run the program against one normalized value and drain its output.
    ///
    /// An evaluation error aborts with the object's identity in the message;
    /// items already written stay written. Subsequent items of the same
    /// sequence may depend on evaluation state that is now suspect, so
    /// there is no per-object recovery.
    pub fn process_object(
        &mut self,
        ident: &ObjectIdent,
        program: &Program,
        doc: Value,
    ) -> Result<()> {
        program.run_with(doc, |item| self.write_item(ident, item))
    }

    #[cfg(test)]
    pub(crate) fn into_sinks(self) -> (W, E) {
        (self.out, self.diag)
    }

    fn write_item(&mut self, ident: &ObjectIdent, item: Emitted) -> Result<()> {
        match item {
            Emitted::Error(err) => bail!("jq: object {ident}: {err}"),
            // A null payload produces no output at all, so expressions can
            // filter items out.
            Emitted::Diagnostic(Value::Null) | Emitted::Value(Value::Null) => Ok(()),
            Emitted::Diagnostic(value) => {
                // Diagnostics are always compact and unframed; the raw
                // string option does not apply here.
                let bytes = CompactJson.marshal(&value).context("format diagnostic")?;
                self.diag.write_all(&bytes).context("write diagnostic")?;
                Ok(())
            }
            Emitted::Value(value) => {
                let bytes = match &value {
                    Value::String(s) if self.raw_strings => s.clone().into_bytes(),
                    _ => self.formatter.marshal(&value).context("format")?,
                };
                self.out.write_all(&bytes).context("write")?;
                self.out.write_all(b"\n").context("write newline")?;
                Ok(())
            }
        }
    }
}
