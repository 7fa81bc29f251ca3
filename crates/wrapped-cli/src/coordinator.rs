//! The coordinator task: sole owner of the collected results.
//!
//! Page tasks never share state with each other. Each one sends its
//! messages through a [`CoordinatorHandle`]; the coordinator applies them to
//! its [`Collector`] one at a time and acknowledges each on a oneshot
//! channel. Dropping every handle stops the task, which hands the collector
//! back. A collector mirrored to a store file is driven on the blocking pool
//! so its file writes never stall the runtime's worker threads.

use anyhow::Context;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use wrapped_core::{Collector, Message, Response, TabId};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
struct Envelope {
    tab: Option<TabId>,
    message: Message,
    reply: oneshot::Sender<Response>,
}

#[derive(Debug, Clone)]
pub(crate) struct CoordinatorHandle {
    tx: mpsc::Sender<Envelope>,
}

impl CoordinatorHandle {
    /// Delivers `message` and waits for its acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator has stopped.
    pub(crate) async fn send(
        &self,
        tab: Option<TabId>,
        message: Message,
    ) -> anyhow::Result<Response> {
        let (reply, ack) = oneshot::channel();
        self.tx
            .send(Envelope {
                tab,
                message,
                reply,
            })
            .await
            .ok()
            .context("coordinator is not running")?;
        ack.await.context("coordinator dropped the message")
    }
}

/// Starts the coordinator on the current runtime.
pub(crate) fn spawn_coordinator(
    collector: Collector,
) -> (CoordinatorHandle, JoinHandle<anyhow::Result<Collector>>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut collector = collector;
        while let Some(Envelope {
            tab,
            message,
            reply,
        }) = rx.recv().await
        {
            let response = if collector.is_persistent() {
                let (returned, response) = tokio::task::spawn_blocking(move || {
                    let response = collector.handle(tab, message);
                    (collector, response)
                })
                .await
                .context("collector store update failed")?;
                collector = returned;
                response
            } else {
                collector.handle(tab, message)
            };
            if reply.send(response).is_err() {
                tracing::debug!(?tab, "sender stopped waiting for acknowledgement");
            }
        }
        tracing::debug!(chunks = collector.len(), "coordinator stopped");
        Ok::<_, anyhow::Error>(collector)
    });

    (CoordinatorHandle { tx }, task)
}
