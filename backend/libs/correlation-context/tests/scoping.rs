use correlation_context::{headers, CorrelationContext};
use futures::future::join_all;

fn context_with(request_id: &str) -> CorrelationContext {
    let context = CorrelationContext::new();
    context.set(headers::REQUEST_ID, request_id);
    context
}

async fn nested_stage() -> Option<String> {
    tokio::task::yield_now().await;
    correlation_context::request_id()
}

#[tokio::test]
async fn test_context_visible_at_any_call_depth() {
    let seen = context_with("deep")
        .scope(async {
            let first = nested_stage().await;
            let second = async { nested_stage().await }.await;
            (first, second)
        })
        .await;

    assert_eq!(seen.0.as_deref(), Some("deep"));
    assert_eq!(seen.1.as_deref(), Some("deep"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_interleaved_requests_on_one_thread_are_isolated() {
    // All futures share one thread and yield to each other between reads
    let requests = (0..50).map(|i| {
        let id = format!("request-{i}");
        let context = context_with(&id);
        async move {
            let observed = context
                .scope(async {
                    let mut observed = Vec::new();
                    for _ in 0..5 {
                        observed.push(nested_stage().await);
                    }
                    observed
                })
                .await;
            (id, observed)
        }
    });

    for (id, observed) in join_all(requests).await {
        assert!(observed.iter().all(|v| v.as_deref() == Some(id.as_str())));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_requests_on_pool_are_isolated() {
    let handles: Vec<_> = (0..32)
        .map(|i| {
            let id = format!("pooled-{i}");
            let context = context_with(&id);
            tokio::spawn(context.scope(async move {
                for _ in 0..10 {
                    assert_eq!(nested_stage().await.as_deref(), Some(id.as_str()));
                }
            }))
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_values_set_during_request_are_shared_with_caller() {
    let context = context_with("outer");

    context
        .clone()
        .scope(async {
            assert!(correlation_context::set(headers::EXECUTION_ID, "exec-1"));
        })
        .await;

    assert_eq!(context.get(headers::EXECUTION_ID).as_deref(), Some("exec-1"));
}

#[tokio::test]
async fn test_blocking_work_sees_captured_context() {
    let seen = context_with("blocking")
        .scope(async {
            let lookup = correlation_context::propagate_blocking(correlation_context::request_id);
            tokio::task::spawn_blocking(lookup).await.unwrap()
        })
        .await;

    assert_eq!(seen.as_deref(), Some("blocking"));
}

#[tokio::test]
async fn test_blocking_work_without_context_sees_nothing() {
    let lookup = correlation_context::propagate_blocking(correlation_context::request_id);
    let seen = tokio::task::spawn_blocking(lookup).await.unwrap();

    assert!(seen.is_none());
}

#[tokio::test]
async fn test_nothing_bound_after_scope_ends() {
    context_with("short-lived")
        .scope(async {
            assert!(correlation_context::current().is_some());
        })
        .await;

    assert!(correlation_context::current().is_none());
}
