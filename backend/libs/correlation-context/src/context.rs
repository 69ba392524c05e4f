//! Per-request correlation store and its task-local binding
//!
//! ## Design
//! - One `CorrelationContext` per inbound request, shared by clone (`Arc`)
//! - Bound to the request's future with `tokio::task_local!`, so requests
//!   interleaved on the same worker thread never see each other's values
//! - Reads outside a bound scope return `None`

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

use crate::headers;

tokio::task_local! {
    static CURRENT: CorrelationContext;
}

/// Correlation values of one request, keyed by header name
///
/// Header names are matched case-insensitively. Values are kept verbatim.
#[derive(Debug, Clone, Default)]
pub struct CorrelationContext {
    values: Arc<DashMap<String, String>>,
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl CorrelationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the value for a header
    pub fn set(&self, name: &str, value: impl Into<String>) {
        self.values.insert(normalize(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(&normalize(name)).map(|v| v.value().clone())
    }

    /// Shortcut for the request id header
    pub fn request_id(&self) -> Option<String> {
        self.get(headers::REQUEST_ID)
    }

    pub fn clear(&self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot of all `(header name, value)` pairs, sorted by name
    ///
    /// Names are returned lowercased.
    pub fn values(&self) -> Vec<(String, String)> {
        let mut values: Vec<_> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        values.sort();
        values
    }

    /// Run `fut` with this context bound as the current one
    pub fn scope<F>(self, fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT.scope(self, fut)
    }

    /// Run a synchronous closure with this context bound as the current one
    pub fn sync_scope<F, R>(self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT.sync_scope(self, f)
    }

    /// Guard that clears this context when dropped
    pub fn guard(&self) -> ContextGuard {
        ContextGuard {
            context: self.clone(),
        }
    }
}

/// Clears its context on drop, including on unwinding and cancellation
#[must_use = "the context is cleared as soon as the guard is dropped"]
pub struct ContextGuard {
    context: CorrelationContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        tracing::trace!(
            entries = self.context.len(),
            "Clearing correlation context"
        );
        self.context.clear();
    }
}

/// Context bound to the current execution, if any
pub fn current() -> Option<CorrelationContext> {
    CURRENT.try_with(|context| context.clone()).ok()
}

/// Read a header value from the current context
pub fn get(name: &str) -> Option<String> {
    CURRENT.try_with(|context| context.get(name)).ok().flatten()
}

/// Set a header value on the current context
///
/// Returns `false` when no context is bound.
pub fn set(name: &str, value: impl Into<String>) -> bool {
    CURRENT.try_with(|context| context.set(name, value)).is_ok()
}

/// Request id of the current context
pub fn request_id() -> Option<String> {
    get(headers::REQUEST_ID)
}

/// Capture the current context for a closure that runs elsewhere
///
/// Task-locals do not follow work onto the blocking pool, so wrap the
/// closure before handing it to `spawn_blocking` / `web::block`:
///
/// ```rust
/// # async fn example() {
/// let lookup = correlation_context::propagate_blocking(|| correlation_context::request_id());
/// let _ = tokio::task::spawn_blocking(lookup).await;
/// # }
/// ```
pub fn propagate_blocking<F, R>(f: F) -> impl FnOnce() -> R
where
    F: FnOnce() -> R,
{
    let captured = current();
    move || match captured {
        Some(context) => context.sync_scope(f),
        None => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_case_insensitive() {
        let context = CorrelationContext::new();
        context.set("X-Spinnaker-Request-Id", "abc");

        assert_eq!(context.get(headers::REQUEST_ID).as_deref(), Some("abc"));
        assert_eq!(context.get("x-spinnaker-request-id").as_deref(), Some("abc"));
    }

    #[test]
    fn test_values_are_case_sensitive() {
        let context = CorrelationContext::new();
        context.set(headers::REQUEST_ID, "MixedCase-Value");

        assert_eq!(context.request_id().as_deref(), Some("MixedCase-Value"));
    }

    #[test]
    fn test_absent_key_returns_none() {
        let context = CorrelationContext::new();
        assert!(context.get(headers::EXECUTION_ID).is_none());
        assert!(get(headers::EXECUTION_ID).is_none());
        assert!(!set(headers::EXECUTION_ID, "ignored"));
    }

    #[test]
    fn test_guard_clears_on_drop() {
        let context = CorrelationContext::new();
        context.set(headers::REQUEST_ID, "abc");

        {
            let _guard = context.guard();
            assert_eq!(context.len(), 1);
        }

        assert!(context.is_empty());
    }

    #[test]
    fn test_sync_scope_binds_context() {
        let context = CorrelationContext::new();
        context.set(headers::REQUEST_ID, "sync");

        let seen = context.sync_scope(request_id);
        assert_eq!(seen.as_deref(), Some("sync"));
        assert!(current().is_none());
    }

    #[test]
    fn test_values_snapshot_sorted() {
        let context = CorrelationContext::new();
        context.set(headers::REQUEST_ID, "r");
        context.set(headers::APPLICATION, "app");

        assert_eq!(
            context.values(),
            vec![
                ("x-spinnaker-application".to_string(), "app".to_string()),
                ("x-spinnaker-request-id".to_string(), "r".to_string()),
            ]
        );
    }
}
