// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! The object source.
//!
//! Connects to one cluster via the kubeconfig and supplies the sequence of
//! raw objects for the pipeline. Listing is paginated with continue tokens
//! and transient API failures are retried with exponential backoff; both
//! stay internal to this module, the caller sees a single blocking pull.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use kube::api::{DynamicObject, ListParams, TypeMeta};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::Scope;
use kube::{Api, Client, Config};
use tracing::{debug, warn};

use super::discovery;

/// Timeout for connecting to the K8s API
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for transient failures
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (doubles each retry)
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Page size for paginated list requests
const PAGE_SIZE: u32 = 500;

/// Supplies resource objects from one cluster, scoped to a namespace or
/// to all namespaces.
pub struct ObjectSource {
    client: Client,
    namespace: String,
    all_namespaces: bool,
}

impl ObjectSource {
    /// Build a client for the given kubeconfig context (current context if
    /// None). The default namespace comes from an explicit override, then
    /// the context, then "default".
    pub async fn connect(
        context: Option<&str>,
        namespace: Option<&str>,
        all_namespaces: bool,
    ) -> Result<Self> {
        let kubeconfig = Kubeconfig::read().context("read kubeconfig")?;

        let context_name = context
            .map(String::from)
            .or_else(|| kubeconfig.current_context.clone())
            .ok_or_else(|| anyhow!("No context specified and no current context in kubeconfig"))?;

        let named_context = kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| anyhow!("Context '{}' not found in kubeconfig", context_name))?;

        let namespace = namespace
            .map(String::from)
            .or_else(|| {
                named_context
                    .context
                    .as_ref()
                    .and_then(|c| c.namespace.clone())
            })
            .unwrap_or_else(|| "default".to_string());

        let mut config = Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: Some(context_name.clone()),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to load kubeconfig for context '{}'", context_name))?;

        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        let client = Client::try_from(config)
            .with_context(|| format!("Failed to create client for context '{}'", context_name))?;

        debug!(context = %context_name, namespace = %namespace, "Connected");

        Ok(Self {
            client,
            namespace,
            all_namespaces,
        })
    }

    /// Fetch the requested objects: a single named get, or a full
    /// (paginated) list of the resource type.
    pub async fn fetch(&self, resource_type: &str, name: Option<&str>) -> Result<Vec<DynamicObject>> {
        let (ar, caps) = discovery::resolve_resource(&self.client, resource_type).await?;

        debug!(
            resource = %resource_type,
            group = %ar.group,
            version = %ar.version,
            kind = %ar.kind,
            name = ?name,
            "Fetching K8s resource"
        );

        let api: Api<DynamicObject> = if caps.scope == Scope::Namespaced && !self.all_namespaces {
            Api::namespaced_with(self.client.clone(), &self.namespace, &ar)
        } else {
            Api::all_with(self.client.clone(), &ar)
        };

        let mut items = match name {
            Some(name) => {
                let object = api.get(name).await.map_err(|e| {
                    anyhow::Error::new(e)
                        .context(format!("get {} \"{}\"", resource_type, name))
                })?;
                vec![object]
            }
            None => self.list_all_pages(&api, resource_type).await?,
        };

        // The list API omits per-item apiVersion/kind, fill them in so the
        // jq program can see them.
        let types = TypeMeta {
            api_version: ar.api_version.clone(),
            kind: ar.kind.clone(),
        };
        for item in &mut items {
            if item.types.is_none() {
                item.types = Some(types.clone());
            }
        }

        Ok(items)
    }

    /// List every page of a resource, following continue tokens.
    async fn list_all_pages(
        &self,
        api: &Api<DynamicObject>,
        resource_type: &str,
    ) -> Result<Vec<DynamicObject>> {
        let mut all_items: Vec<DynamicObject> = Vec::new();
        let mut continue_token: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            let mut params = ListParams::default().limit(PAGE_SIZE);
            if let Some(ref token) = continue_token {
                params = params.continue_token(token);
            }

            let list = self.list_page_with_retry(api, &params, resource_type).await?;

            let items_this_page = list.items.len();
            all_items.extend(list.items);
            page_count += 1;

            match list.metadata.continue_ {
                Some(token) if !token.is_empty() => {
                    debug!(
                        resource = %resource_type,
                        page = page_count,
                        items_this_page,
                        total_so_far = all_items.len(),
                        "Fetched page, continuing"
                    );
                    continue_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(all_items)
    }

    /// Fetch a single page, retrying transient failures with backoff.
    async fn list_page_with_retry(
        &self,
        api: &Api<DynamicObject>,
        params: &ListParams,
        resource_type: &str,
    ) -> Result<kube::api::ObjectList<DynamicObject>> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match api.list(params).await {
                Ok(list) => return Ok(list),
                Err(e) if is_retryable_error(&e) => {
                    // No point backing off after the last attempt
                    if let Some(delay) = backoff_delay(attempt) {
                        warn!(
                            resource = %resource_type,
                            attempt = attempt + 1,
                            max_attempts = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retryable error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("list {}", resource_type)));
                }
            }
        }

        Err(anyhow!(
            "list {}: failed after {} retries: {}",
            resource_type,
            MAX_RETRIES,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }
}

/// Backoff before the next attempt, or None once no attempts remain.
fn backoff_delay(attempt: u32) -> Option<Duration> {
    (attempt + 1 < MAX_RETRIES).then(|| RETRY_BASE_DELAY * 2u32.pow(attempt))
}

/// Transient failures worth retrying: connection errors, rate limiting
/// and temporary server unavailability.
fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::HyperError(_) => true,
        kube::Error::Api(api_err) => matches!(api_err.code, 429 | 503 | 504),
        _ => false,
    }
}

/// Whether an error chain bottoms out in a Kubernetes "not found" response.
/// Used to implement --ignore-not-found.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<kube::Error>(),
            Some(kube::Error::Api(resp)) if resp.code == 404
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "synthetic".to_string(),
            reason: "Testing".to_string(),
            code,
        })
    }

    #[test]
    fn test_not_found_detected_through_context() {
        let err = anyhow::Error::new(api_error(404)).context("get pods \"x\"");
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_other_api_errors_are_not_not_found() {
        let err = anyhow::Error::new(api_error(403)).context("get pods \"x\"");
        assert!(!is_not_found(&err));
        assert!(!is_not_found(&anyhow!("plain error")));
    }

    #[test]
    fn test_backoff_doubles_and_stops_after_last_attempt() {
        assert_eq!(backoff_delay(0), Some(Duration::from_millis(100)));
        assert_eq!(backoff_delay(1), Some(Duration::from_millis(200)));
        assert_eq!(backoff_delay(MAX_RETRIES - 1), None);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error(&api_error(429)));
        assert!(is_retryable_error(&api_error(503)));
        assert!(is_retryable_error(&api_error(504)));
        assert!(!is_retryable_error(&api_error(404)));
        assert!(!is_retryable_error(&api_error(500)));
    }
}
