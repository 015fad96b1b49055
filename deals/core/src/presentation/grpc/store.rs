// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Store orchestration: client-streamed payload -> deals module store call.
//!
//! The first message must carry the store params. The store call is then
//! spawned with the read side of an ingest pipe while this task keeps
//! receiving chunks and writing them into the pipe. The call's result comes
//! back through a oneshot channel and is the RPC's outcome: when it failed
//! (typically because the pipe was closed with a receive error) its error is
//! returned and the receive error is not reported separately.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, info, warn};

use super::proto::{self, store_request::Payload as WirePayload};
use super::translate;
use crate::application::ingest_pipe::{self, PipeWriter};
use crate::domain::deals_module::DealsModule;

/// How the receive loop ended.
enum Ingested {
    /// Client finished sending; the pipe was closed cleanly
    Complete { bytes: u64 },
    /// Receiving failed; the pipe was closed with the receive error
    Interrupted(Status),
    /// The store call dropped its reader before the upload ended
    ReaderGone(io::Error),
}

pub struct StoreOrchestrator {
    module: Arc<dyn DealsModule>,
    pipe_capacity: usize,
}

impl StoreOrchestrator {
    pub fn new(module: Arc<dyn DealsModule>, pipe_capacity: usize) -> Self {
        Self {
            module,
            pipe_capacity,
        }
    }

    /// Drive one Store RPC to its single reply.
    pub async fn run<S>(&self, inbound: S) -> Result<proto::StoreReply, Status>
    where
        S: Stream<Item = Result<proto::StoreRequest, Status>> + Send,
    {
        tokio::pin!(inbound);

        let params = match inbound.next().await {
            Some(Ok(proto::StoreRequest {
                payload: Some(WirePayload::StoreParams(params)),
            })) => translate::store_params_from_wire(params),
            Some(Ok(request)) => {
                let kind = payload_kind(&request.payload);
                warn!("Rejecting Store stream: first payload is {}", kind);
                return Err(Status::invalid_argument(format!(
                    "expected store params as first Store payload but got {}",
                    kind
                )));
            }
            Some(Err(status)) => return Err(status),
            None => {
                return Err(Status::invalid_argument(
                    "Store stream ended before store params were received",
                ))
            }
        };

        info!(
            address = %params.address,
            deals = params.deal_configs.len(),
            duration = params.duration,
            "Starting store call"
        );

        let (writer, reader) = ingest_pipe::pipe(self.pipe_capacity);
        let cancel = CancellationToken::new();
        // Cancels the store call on every exit, including the RPC being dropped
        let _cancel_on_exit = cancel.clone().drop_guard();

        let (result_tx, result_rx) = oneshot::channel();
        let module = Arc::clone(&self.module);
        tokio::spawn(async move {
            let result = module
                .store(
                    cancel,
                    &params.address,
                    Box::new(reader),
                    params.deal_configs,
                    params.duration,
                )
                .await;
            let _ = result_tx.send(result);
        });

        let ingested = ingest(&mut inbound, writer).await?;

        let result = result_rx
            .await
            .map_err(|_| Status::internal("store call ended without delivering a result"))?;

        let outcome = match (result, ingested) {
            (Err(err), _) => {
                warn!("Store call failed: {}", err);
                return Err(err.into());
            }
            (Ok(_), Ingested::ReaderGone(err)) => {
                return Err(Status::aborted(format!(
                    "store call returned before consuming the payload: {}",
                    err
                )));
            }
            (Ok(_), Ingested::Interrupted(status)) => {
                return Err(Status::aborted(format!(
                    "Store stream interrupted: {}",
                    status.message()
                )));
            }
            (Ok(outcome), Ingested::Complete { bytes }) => {
                metrics::counter!("dealbridge_store_bytes_total").increment(bytes);
                debug!("Store payload of {} bytes consumed", bytes);
                outcome
            }
        };

        info!(
            cids = outcome.cids.len(),
            failed_deals = outcome.failed_deals.len(),
            "Store call completed"
        );
        Ok(translate::store_reply(&outcome)?)
    }
}

/// Receive chunks into `writer` until the stream ends. Returns `Err` only for
/// a protocol violation, after failing the pipe.
async fn ingest<S>(inbound: &mut S, mut writer: PipeWriter) -> Result<Ingested, Status>
where
    S: Stream<Item = Result<proto::StoreRequest, Status>> + Unpin,
{
    let mut bytes = 0u64;
    loop {
        match inbound.next().await {
            None => {
                writer.close();
                return Ok(Ingested::Complete { bytes });
            }
            Some(Err(status)) => {
                warn!("Store stream receive failed: {}", status);
                writer.close_with_error(io::Error::other(status.clone()));
                return Ok(Ingested::Interrupted(status));
            }
            Some(Ok(proto::StoreRequest {
                payload: Some(WirePayload::Chunk(chunk)),
            })) => {
                let len = chunk.len() as u64;
                if let Err(err) = writer.write(Bytes::from(chunk)).await {
                    debug!("Store call stopped reading: {}", err);
                    return Ok(Ingested::ReaderGone(err));
                }
                bytes += len;
            }
            Some(Ok(request)) => {
                let kind = payload_kind(&request.payload);
                warn!("Rejecting Store stream: unexpected {} after store params", kind);
                writer.close_with_error(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected {} in Store stream", kind),
                ));
                return Err(Status::invalid_argument(format!(
                    "expected chunk for Store payload but got {}",
                    kind
                )));
            }
        }
    }
}

fn payload_kind(payload: &Option<WirePayload>) -> &'static str {
    match payload {
        Some(WirePayload::StoreParams(_)) => "store params",
        Some(WirePayload::Chunk(_)) => "chunk",
        None => "empty payload",
    }
}
