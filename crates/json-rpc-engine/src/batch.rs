use futures::future::join_all;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::dispatch::JsonRpcDispatcher;
use crate::request::JsonRpcRequest;
use crate::response::{JsonRpcMessage, JsonRpcReply, Outcome};
use crate::types::RequestId;

/// How the elements of one batch are executed.
///
/// Responses are always returned in input order, whatever order the
/// elements complete in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchExecution {
    /// One element after another on the calling task.
    Sequential,
    /// All elements polled together on the calling task.
    #[default]
    Concurrent,
    /// Every element spawned onto the tokio runtime. Falls back to
    /// `Concurrent` when called outside a runtime.
    Spawned,
}

/// Fans a batch out to the dispatcher and assembles the array reply.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    dispatcher: JsonRpcDispatcher,
    execution: BatchExecution,
}

impl BatchOrchestrator {
    pub fn new(dispatcher: JsonRpcDispatcher, execution: BatchExecution) -> Self {
        Self {
            dispatcher,
            execution,
        }
    }

    /// Process every element of a batch.
    ///
    /// Returns `None` when every element was a notification, and a single
    /// Invalid Request for an empty batch.
    pub async fn run(&self, items: Vec<Value>) -> Option<JsonRpcReply> {
        if items.is_empty() {
            debug!("rejecting empty batch");
            return Some(JsonRpcReply::invalid_request());
        }

        let total = items.len();
        let responses: Vec<JsonRpcMessage> = self
            .collect(items)
            .await
            .into_iter()
            .filter_map(Outcome::into_message)
            .collect();

        debug!(total, responses = responses.len(), "batch processed");
        if responses.is_empty() {
            None
        } else {
            Some(JsonRpcReply::Batch(responses))
        }
    }

    /// Outcomes indexed by input position.
    async fn collect(&self, items: Vec<Value>) -> Vec<Outcome> {
        match self.execution {
            BatchExecution::Sequential => {
                let mut outcomes = Vec::with_capacity(items.len());
                for item in items {
                    outcomes.push(self.dispatcher.process(item).await);
                }
                outcomes
            }
            BatchExecution::Concurrent => self.collect_concurrent(items).await,
            BatchExecution::Spawned => {
                if tokio::runtime::Handle::try_current().is_err() {
                    warn!("no tokio runtime for spawned batch execution, polling concurrently");
                    return self.collect_concurrent(items).await;
                }

                let elements: Vec<_> = items
                    .into_iter()
                    .map(|item| self.spawn_element(item))
                    .collect();

                let mut outcomes = Vec::with_capacity(elements.len());
                for element in elements {
                    outcomes.push(match element {
                        SpawnedElement::Rejected(outcome) => outcome,
                        SpawnedElement::Running {
                            id,
                            notification,
                            handle,
                        } => settle(handle.await, id, notification),
                    });
                }
                outcomes
            }
        }
    }

    /// Validate on the calling task so a failed task can still be answered
    /// with the element's own id, or not at all for a notification.
    fn spawn_element(&self, item: Value) -> SpawnedElement {
        match JsonRpcRequest::from_value(item) {
            Ok(request) => {
                let id = request.id.clone().unwrap_or(RequestId::Null);
                let notification = request.is_notification();
                let dispatcher = self.dispatcher.clone();
                SpawnedElement::Running {
                    id,
                    notification,
                    handle: tokio::spawn(async move { dispatcher.dispatch(request).await }),
                }
            }
            Err(reason) => {
                debug!(%reason, "rejecting invalid request");
                SpawnedElement::Rejected(Outcome::invalid_request())
            }
        }
    }

    async fn collect_concurrent(&self, items: Vec<Value>) -> Vec<Outcome> {
        join_all(items.into_iter().map(|item| self.dispatcher.process(item))).await
    }
}

enum SpawnedElement {
    Rejected(Outcome),
    Running {
        id: RequestId,
        notification: bool,
        handle: JoinHandle<Outcome>,
    },
}

fn settle(joined: Result<Outcome, JoinError>, id: RequestId, notification: bool) -> Outcome {
    match joined {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%id, "batch element task failed: {}", err);
            Outcome::internal_error(id).suppressed(notification)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;
    use serde_json::json;

    fn orchestrator(execution: BatchExecution) -> BatchOrchestrator {
        let registry = MethodRegistry::new()
            .with_fn("echo", |ctx| {
                let value = ctx.params().to_value();
                ctx.set_result(value)
            })
            .with_fn("boom", |_ctx| panic!("boom"));
        BatchOrchestrator::new(JsonRpcDispatcher::new(registry), execution)
    }

    const MODES: [BatchExecution; 3] = [
        BatchExecution::Sequential,
        BatchExecution::Concurrent,
        BatchExecution::Spawned,
    ];

    #[tokio::test]
    async fn test_empty_batch_is_invalid_request() {
        for mode in MODES {
            assert_eq!(
                orchestrator(mode).run(vec![]).await,
                Some(JsonRpcReply::invalid_request())
            );
        }
    }

    #[tokio::test]
    async fn test_all_notifications_yield_no_body() {
        let items = vec![
            json!({"jsonrpc": "2.0", "method": "echo", "params": [1]}),
            json!({"jsonrpc": "2.0", "method": "missing"}),
            json!({"jsonrpc": "2.0", "method": "boom"}),
        ];
        for mode in MODES {
            assert_eq!(orchestrator(mode).run(items.clone()).await, None);
        }
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_order_and_isolates_panics() {
        let items = vec![
            json!({"jsonrpc": "2.0", "method": "echo", "params": [1], "id": 1}),
            json!(5),
            json!({"jsonrpc": "2.0", "method": "boom", "id": 2}),
            json!({"jsonrpc": "2.0", "method": "echo", "params": {"x": 1}}),
            json!({"jsonrpc": "2.0", "method": "echo", "params": [3], "id": 3}),
        ];
        let expected = json!([
            {"jsonrpc": "2.0", "result": [1], "id": 1},
            {"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid Request"}, "id": null},
            {"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": 2},
            {"jsonrpc": "2.0", "result": [3], "id": 3}
        ]);

        for mode in MODES {
            let reply = orchestrator(mode).run(items.clone()).await.unwrap();
            assert_eq!(serde_json::to_value(&reply).unwrap(), expected, "mode: {:?}", mode);
        }
    }

    async fn failed_task() -> JoinError {
        let handle = tokio::spawn(std::future::pending::<Outcome>());
        handle.abort();
        handle.await.unwrap_err()
    }

    #[tokio::test]
    async fn test_failed_task_keeps_id() {
        let outcome = settle(Err(failed_task().await), RequestId::from(7i64), false);
        assert_eq!(outcome, Outcome::internal_error(RequestId::from(7i64)));
        assert_eq!(
            serde_json::to_value(outcome.into_message().unwrap()).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": 7})
        );
    }

    #[tokio::test]
    async fn test_failed_notification_task_stays_silent() {
        let outcome = settle(Err(failed_task().await), RequestId::Null, true);
        assert!(outcome.is_error());
        assert_eq!(outcome.into_message(), None);
    }

    #[test]
    fn test_spawned_without_runtime_falls_back() {
        let reply = futures::executor::block_on(
            orchestrator(BatchExecution::Spawned)
                .run(vec![json!({"jsonrpc": "2.0", "method": "echo", "params": [9], "id": 9})]),
        );
        assert_eq!(
            serde_json::to_value(&reply.unwrap()).unwrap(),
            json!([{"jsonrpc": "2.0", "result": [9], "id": 9}])
        );
    }
}
