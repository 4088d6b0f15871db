// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource type resolution against the cluster discovery API.
//!
//! Accepts the spellings kubectl users expect: plural ("pods"), singular
//! ("pod"), kind ("Pod"), short names ("po"), and group-qualified forms
//! ("deployments.apps").

use anyhow::{Context, Result, anyhow};
use kube::Client;
use kube::discovery::{ApiCapabilities, ApiResource, Discovery};

/// Well-known kubectl short names. CRD short names are not known here;
/// CRDs are still reachable by plural, kind or group-qualified name.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("po", "pods"),
    ("svc", "services"),
    ("cm", "configmaps"),
    ("sa", "serviceaccounts"),
    ("ep", "endpoints"),
    ("ev", "events"),
    ("no", "nodes"),
    ("ns", "namespaces"),
    ("pv", "persistentvolumes"),
    ("pvc", "persistentvolumeclaims"),
    ("quota", "resourcequotas"),
    ("limits", "limitranges"),
    ("deploy", "deployments"),
    ("sts", "statefulsets"),
    ("ds", "daemonsets"),
    ("rs", "replicasets"),
    ("cj", "cronjobs"),
    ("ing", "ingresses"),
    ("netpol", "networkpolicies"),
    ("hpa", "horizontalpodautoscalers"),
    ("pdb", "poddisruptionbudgets"),
    ("sc", "storageclasses"),
    ("crd", "customresourcedefinitions"),
];

/// Resolve a resource type string to an API resource on the cluster.
pub async fn resolve_resource(
    client: &Client,
    spec: &str,
) -> Result<(ApiResource, ApiCapabilities)> {
    let discovery = Discovery::new(client.clone())
        .run()
        .await
        .context("discover API resources")?;

    for group in discovery.groups() {
        for (ar, caps) in group.recommended_resources() {
            // Subresources like pods/log are not listable objects
            if ar.plural.contains('/') {
                continue;
            }
            if resource_matches(&ar, spec) {
                return Ok((ar, caps));
            }
        }
    }

    Err(anyhow!("the server doesn't have a resource type {:?}", spec))
}

/// Whether a discovered resource answers to the given spelling.
pub fn resource_matches(ar: &ApiResource, spec: &str) -> bool {
    let want = spec.to_lowercase();
    let want = SHORT_NAMES
        .iter()
        .find(|(short, _)| *short == want)
        .map(|(_, plural)| plural.to_string())
        .unwrap_or(want);

    // Group-qualified form: "deployments.apps", "ingresses.networking.k8s.io"
    let (name, group) = match want.split_once('.') {
        Some((name, group)) => (name, Some(group)),
        None => (want.as_str(), None),
    };
    if let Some(group) = group
        && !ar.group.eq_ignore_ascii_case(group)
    {
        return false;
    }

    let kind = ar.kind.to_lowercase();
    name == ar.plural || name == kind || format!("{name}s") == ar.plural
}
