// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use dealbridge_core::domain::ask::{AskQuery, StorageAsk};
use dealbridge_core::domain::deal::{Cid, DealUpdate, StoreOutcome, StoreParams};
use dealbridge_core::presentation::grpc::proto::{
    self, deals_api_client::DealsApiClient, store_request::Payload,
};
use dealbridge_core::presentation::grpc::translate;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tonic::transport::Channel;

/// Size of the chunk messages a payload is split into.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Client for the dealbridge deals API.
pub struct DealsClient {
    inner: DealsApiClient<Channel>,
    chunk_size: usize,
}

impl DealsClient {
    /// Connect to a deals API endpoint, e.g. `http://127.0.0.1:5002`.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let inner = DealsApiClient::connect(endpoint.clone())
            .await
            .with_context(|| format!("Failed to connect to deals API at {}", endpoint))?;
        Ok(Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Set the payload chunk size used by `store`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// List available storage asks.
    pub async fn available_asks(&mut self, query: AskQuery) -> Result<Vec<StorageAsk>> {
        let reply = self
            .inner
            .available_asks(proto::AvailableAsksRequest {
                query: Some(translate::ask_query_to_wire(query)),
            })
            .await?
            .into_inner();

        Ok(reply
            .asks
            .into_iter()
            .map(translate::storage_ask_from_wire)
            .collect())
    }

    /// Upload `payload` and make the deals described by `params`.
    ///
    /// The payload is streamed while it is read. If reading it fails the
    /// upload is aborted, the server never stores a truncated payload, and
    /// the read error is returned.
    pub async fn store<R>(&mut self, params: &StoreParams, payload: R) -> Result<StoreOutcome>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let params = translate::store_params_to_wire(params)?;
        let chunk_size = self.chunk_size;
        let (read_failed_tx, mut read_failed_rx) = oneshot::channel::<std::io::Error>();

        let outbound = async_stream::stream! {
            yield proto::StoreRequest {
                payload: Some(Payload::StoreParams(params)),
            };

            let mut chunks = ReaderStream::with_capacity(payload, chunk_size);
            let mut read_failed_tx = Some(read_failed_tx);
            while let Some(next) = chunks.next().await {
                match next {
                    Ok(bytes) => {
                        yield proto::StoreRequest {
                            payload: Some(Payload::Chunk(bytes.to_vec())),
                        };
                    }
                    Err(err) => {
                        if let Some(tx) = read_failed_tx.take() {
                            let _ = tx.send(err);
                        }
                        // An empty payload is a protocol violation: the server
                        // fails the store instead of seeing a clean end of upload
                        yield proto::StoreRequest { payload: None };
                        break;
                    }
                }
            }
        };

        let reply = self.inner.store(outbound).await;
        if let Ok(err) = read_failed_rx.try_recv() {
            tracing::warn!("Store upload aborted: {}", err);
            return Err(anyhow::Error::new(err).context("Failed to read store payload; upload aborted"));
        }

        let reply = reply?.into_inner();
        Ok(translate::store_outcome_from_wire(reply)?)
    }

    /// Stream status updates for `proposals` until the server ends the stream.
    pub async fn watch(&mut self, proposals: &[Cid]) -> Result<BoxStream<'static, Result<DealUpdate>>> {
        let request = proto::WatchRequest {
            proposals: proposals.iter().map(|p| p.to_string()).collect(),
        };
        let replies = self.inner.watch(request).await?.into_inner();

        Ok(replies
            .map(|reply| -> Result<DealUpdate> {
                let reply = reply?;
                Ok(translate::deal_update_from_wire(reply)?)
            })
            .boxed())
    }
}
