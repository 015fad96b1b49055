// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Watch forwarding: deals module update stream -> server-streamed replies.
//!
//! One subscription per RPC. Each update is translated and handed to the
//! response stream as soon as it arrives, in module order. Forwarding stops
//! without error when the module stream ends, when the client drops the
//! response stream, or when the service shutdown token fires; a subscription
//! error becomes the stream's terminal status.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, info, warn};

use super::proto;
use super::translate;
use crate::domain::deals_module::{DealUpdateStream, DealsModule};

pub type WatchReplyStream = ReceiverStream<Result<proto::WatchReply, Status>>;

// One reply in flight; the forwarder waits for the transport to take it
const REPLY_BUFFER: usize = 1;

/// Why forwarding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    /// The module closed the update stream
    Completed,
    /// The client dropped the response stream
    ClientGone,
    /// The service is shutting down
    Shutdown,
    /// A terminal error status was sent to the client
    Failed,
}

pub struct WatchForwarder {
    module: Arc<dyn DealsModule>,
    shutdown: CancellationToken,
}

impl WatchForwarder {
    pub fn new(module: Arc<dyn DealsModule>, shutdown: CancellationToken) -> Self {
        Self { module, shutdown }
    }

    /// Decode `proposals`, open the subscription and start forwarding.
    ///
    /// Malformed proposals fail with `INVALID_ARGUMENT` before the module is
    /// contacted. With no proposals the subscription is opened and released
    /// at once, and the returned stream ends immediately.
    pub async fn open(&self, proposals: &[String]) -> Result<WatchReplyStream, Status> {
        let proposals = translate::decode_proposals(proposals)?;
        let watched = proposals.len();

        let cancel = self.shutdown.child_token();
        // Cancels the subscription if subscribing fails or this call is dropped
        let release = cancel.clone().drop_guard();
        let updates = self
            .module
            .watch(cancel, proposals)
            .await
            .map_err(Status::from)?;

        let (tx, rx) = mpsc::channel(REPLY_BUFFER);
        if watched == 0 {
            debug!("Watch requested with no proposals; closing subscription");
            drop(updates);
            drop(release);
            return Ok(ReceiverStream::new(rx));
        }

        info!(proposals = watched, "Watching deal proposals");
        // forward_updates holds its own guard from here on
        let cancel = release.disarm();
        tokio::spawn(async move {
            let end = forward_updates(updates, tx, cancel).await;
            info!(?end, "Watch forwarding stopped");
        });
        Ok(ReceiverStream::new(rx))
    }
}

/// Relay `updates` into `tx` until one side is done or `cancel` fires.
///
/// The subscription is dropped and `cancel` is cancelled on return.
pub async fn forward_updates(
    mut updates: DealUpdateStream,
    tx: mpsc::Sender<Result<proto::WatchReply, Status>>,
    cancel: CancellationToken,
) -> WatchEnd {
    let _release = cancel.clone().drop_guard();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return WatchEnd::Shutdown,
            _ = tx.closed() => return WatchEnd::ClientGone,
            next = updates.next() => next,
        };

        let reply = match next {
            None => return WatchEnd::Completed,
            Some(Ok(update)) => translate::watch_reply(update).map_err(Status::from),
            Some(Err(err)) => Err(Status::from(err)),
        };
        let terminal = reply.is_err();
        if let Err(status) = &reply {
            warn!("Watch subscription failed: {}", status.message());
        }

        tokio::select! {
            _ = cancel.cancelled() => return WatchEnd::Shutdown,
            sent = tx.send(reply) => {
                if sent.is_err() {
                    return WatchEnd::ClientGone;
                }
            }
        }
        if terminal {
            return WatchEnd::Failed;
        }
        metrics::counter!("dealbridge_watch_updates_total").increment(1);
    }
}
