// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Run orchestration: resolve options once, fetch, then drive the
//! per-object pipeline.

use std::io;

use anyhow::{Context, Result};
use kube::api::DynamicObject;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::Args;
use crate::jq;
use crate::kubernetes::{self, ObjectSource};
use crate::normalize;
use crate::output::OutputFormat;
use crate::pipeline::{ObjectIdent, Pipeline};

/// Immutable per-run configuration, resolved once at startup.
#[derive(Debug)]
pub struct RunOptions {
    pub resource_type: String,
    pub resource_name: Option<String>,
    pub namespace: Option<String>,
    pub all_namespaces: bool,
    pub context: Option<String>,
    pub ignore_not_found: bool,
    pub flatten: bool,
    pub raw_strings: bool,
    pub format: OutputFormat,
    pub program: jq::Program,
}

impl RunOptions {
    /// Resolve parsed arguments into run options. Compiles the jq program,
    /// so an expression syntax error surfaces here.
    pub fn from_args(args: Args) -> Result<Self> {
        let (resource_type, resource_name, expr) = args.positionals();
        let program = jq::compile(&expr).context("parse jq program")?;

        Ok(Self {
            resource_type,
            resource_name,
            namespace: args.namespace,
            all_namespaces: args.all_namespaces,
            context: args.context,
            ignore_not_found: args.ignore_not_found,
            flatten: args.flatten,
            raw_strings: args.raw,
            format: OutputFormat::from_selector(&args.output),
            program,
        })
    }
}

/// Fetch the requested objects and stream every jq result.
pub async fn run(options: RunOptions) -> Result<()> {
    let source = ObjectSource::connect(
        options.context.as_deref(),
        options.namespace.as_deref(),
        options.all_namespaces,
    )
    .await?;

    let objects = match source
        .fetch(&options.resource_type, options.resource_name.as_deref())
        .await
    {
        Ok(objects) => objects,
        Err(e) if options.ignore_not_found && kubernetes::is_not_found(&e) => {
            debug!(resource = %options.resource_type, "Not found, suppressed");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    info!(
        resource = %options.resource_type,
        count = objects.len(),
        "Fetched objects"
    );

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut pipeline = Pipeline::new(
        stdout.lock(),
        stderr.lock(),
        options.format.formatter(),
        options.raw_strings,
    );

    if wrap_in_list(options.flatten, options.resource_name.is_some()) {
        // Run the program once over a v1/List of everything we fetched.
        let mut items = Vec::with_capacity(objects.len());
        for object in &objects {
            items.push(normalize::normalize(object)?);
        }
        pipeline.process_object(&ObjectIdent::default(), &options.program, list_document(items))?;
    } else {
        for object in &objects {
            let ident = object_ident(object);
            let doc = normalize::normalize(object)
                .with_context(|| format!("object {ident}"))?;
            pipeline.process_object(&ident, &options.program, doc)?;
        }
    }

    Ok(())
}

/// Whether the fetched objects are evaluated as one synthetic v1/List.
///
/// A named get always evaluates the object itself, with its own identity;
/// disabling --flatten only withholds list expansion.
fn wrap_in_list(flatten: bool, named: bool) -> bool {
    !flatten && !named
}

/// The synthetic v1/List evaluated when list expansion is disabled.
fn list_document(items: Vec<Value>) -> Value {
    json!({"apiVersion": "v1", "kind": "List", "items": items})
}

/// Identity used to attribute errors for one fetched object.
fn object_ident(object: &DynamicObject) -> ObjectIdent {
    ObjectIdent::new(
        object.metadata.namespace.clone().unwrap_or_default(),
        object.metadata.name.clone().unwrap_or_default(),
    )
}
