//! Concurrent batch execution

use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::response::JsonRpcMessage;
use crate::server::JsonRpcServer;

/// Run every batch element on its own task and collect the responses.
///
/// Responses come back in completion order. Notifications contribute
/// nothing. The join is count-based: the channel closes once every task has
/// dropped its sender, so a task that dies without sending is noticed
/// rather than waited on forever.
pub(crate) async fn execute_batch(
    server: &JsonRpcServer,
    transport: Arc<Parts>,
    elements: Vec<Bytes>,
) -> Vec<JsonRpcMessage> {
    let expected = elements.len();
    let (tx, mut rx) = mpsc::channel(expected.max(1));

    for element in elements {
        let tx = tx.clone();
        let server = server.clone();
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let message = server.handle_one(transport, &element).await;
            // receiver outlives every sender
            let _ = tx.send(message).await;
        });
    }
    drop(tx);

    let mut messages = Vec::with_capacity(expected);
    let mut received = 0usize;
    while let Some(message) = rx.recv().await {
        received += 1;
        messages.extend(message);
    }

    if received < expected {
        warn!(
            expected,
            received, "batch elements finished without a result, a handler may have panicked"
        );
    }
    debug!(len = expected, responses = messages.len(), "batch complete");
    messages
}
