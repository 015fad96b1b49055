// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! gRPC Server Implementation for the deals API
//! Exposes AvailableAsks, Store (client streaming) and Watch (server streaming)

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};

use super::proto::deals_api_server::{DealsApi, DealsApiServer};
use super::proto::*;
use super::store::StoreOrchestrator;
use super::translate;
use super::watch::{WatchForwarder, WatchReplyStream};
use crate::domain::ask::AskIndex;
use crate::domain::deals_module::DealsModule;
use crate::domain::service_config::ServiceConfigManifest;

/// Implementation of the DealsApi gRPC service
pub struct DealsApiService {
    ask_index: Arc<dyn AskIndex>,
    store: StoreOrchestrator,
    watch: WatchForwarder,
    shutdown: CancellationToken,
}

impl DealsApiService {
    pub fn new(
        module: Arc<dyn DealsModule>,
        ask_index: Arc<dyn AskIndex>,
        pipe_capacity: usize,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            ask_index,
            store: StoreOrchestrator::new(module.clone(), pipe_capacity),
            watch: WatchForwarder::new(module, shutdown.clone()),
            shutdown,
        }
    }

    /// Token that ends every active Watch stream when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Create a gRPC server instance
    pub fn into_server(self) -> DealsApiServer<Self> {
        DealsApiServer::new(self)
    }
}

fn record_outcome<T>(rpc: &'static str, result: &Result<T, Status>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    metrics::counter!("dealbridge_rpc_requests_total", "rpc" => rpc, "outcome" => outcome)
        .increment(1);
}

#[tonic::async_trait]
impl DealsApi for DealsApiService {
    type WatchStream = WatchReplyStream;

    /// List available storage asks
    async fn available_asks(
        &self,
        request: Request<AvailableAsksRequest>,
    ) -> Result<Response<AvailableAsksReply>, Status> {
        let query = translate::ask_query_from_wire(request.into_inner().query);
        tracing::debug!("AvailableAsks query: {:?}", query);

        let result = self
            .ask_index
            .available_asks(query)
            .await
            .map(|asks| AvailableAsksReply {
                asks: asks.into_iter().map(translate::storage_ask_to_wire).collect(),
            })
            .map_err(Status::from);

        record_outcome("available_asks", &result);
        result.map(Response::new)
    }

    /// Store a client-streamed payload
    async fn store(
        &self,
        request: Request<Streaming<StoreRequest>>,
    ) -> Result<Response<StoreReply>, Status> {
        let result = self.store.run(request.into_inner()).await;

        record_outcome("store", &result);
        result.map(Response::new)
    }

    /// Stream deal status updates
    async fn watch(
        &self,
        request: Request<WatchRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        let req = request.into_inner();
        let result = self.watch.open(&req.proposals).await;

        record_outcome("watch", &result);
        result.map(Response::new)
    }
}

/// Start the gRPC server and serve until `shutdown` is cancelled.
///
/// The configuration is validated first. Cancelling `shutdown` also ends every
/// active Watch stream.
pub async fn start_grpc_server(
    config: &ServiceConfigManifest,
    module: Arc<dyn DealsModule>,
    ask_index: Arc<dyn AskIndex>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    config
        .validate()
        .context("Refusing to start gRPC server with invalid configuration")?;
    let addr = config.grpc_addr()?;
    let service = DealsApiService::new(module, ask_index, config.spec.ingest.pipe_capacity);

    let service_shutdown = service.shutdown_token();
    let server = service.into_server();

    tracing::info!("Starting dealbridge gRPC server on {}", addr);

    tonic::transport::Server::builder()
        .add_service(server)
        .serve_with_shutdown(addr, async move {
            shutdown.cancelled().await;
            service_shutdown.cancel();
        })
        .await?;

    tracing::info!("dealbridge gRPC server stopped");
    Ok(())
}
