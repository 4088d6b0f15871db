// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{ArgAction, Parser};

const EXAMPLE: &str = "\
Examples:
    # print the ports that pods have configured
    kubectl jq pod '.spec.containers[].ports[]'

    # print the image of one named pod, unquoted
    kubectl jq pod mypod -r '.spec.containers[0].image'";

#[derive(Parser, Debug)]
#[command(name = "kubectl-jq")]
#[command(version, about = "Execute a jq program against a resource and print the result")]
#[command(after_help = EXAMPLE)]
pub struct Args {
    /// Resource type to inspect (like "pods")
    #[arg(value_name = "RESOURCE_TYPE")]
    pub resource_type: String,

    /// Resource name, or the jq expression when only two arguments are given
    #[arg(value_name = "NAME_OR_EXPR")]
    pub arg2: Option<String>,

    /// jq expression to run over each object (default "." to just print)
    #[arg(value_name = "EXPR")]
    pub arg3: Option<String>,

    /// If present, list the requested object(s) across all namespaces
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,

    /// If the requested object does not exist the command will return exit code 0
    #[arg(long)]
    pub ignore_not_found: bool,

    /// Output format. One of: json|jsoncompact|jsonpretty|yaml|yamlnosep
    #[arg(short, long, default_value = "jsonpretty")]
    pub output: String,

    /// If true, execute the jq program over each item rather than a v1/List containing all the items
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub flatten: bool,

    /// If true, output bare strings without quotes
    #[arg(short, long)]
    pub raw: bool,

    /// Namespace to list objects in (defaults to the kubeconfig context namespace)
    #[arg(short, long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Kubeconfig context to use (defaults to the current context)
    #[arg(long, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the positional arguments into (resource type, name, expression).
    ///
    /// One positional is just the type, two are type plus expression, and
    /// three are type, name, expression. The default expression is the
    /// identity filter.
    pub fn positionals(&self) -> (String, Option<String>, String) {
        match (&self.arg2, &self.arg3) {
            (Some(name), Some(expr)) => {
                (self.resource_type.clone(), Some(name.clone()), expr.clone())
            }
            (Some(expr), None) => (self.resource_type.clone(), None, expr.clone()),
            _ => (self.resource_type.clone(), None, ".".to_string()),
        }
    }
}
