// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use bytes::Bytes;
use dealbridge_core::domain::ask::{AskIndex, AskIndexError, AskQuery, StorageAsk};
use dealbridge_core::domain::deal::{Cid, DealConfig, DealUpdate, StoreOutcome, StoreParams};
use dealbridge_core::domain::deals_module::{DealUpdateStream, DealsError, DealsModule, Payload};
use dealbridge_core::presentation::grpc::server::DealsApiService;
use dealbridge_sdk::DealsClient;
use futures::StreamExt;
use num_bigint::BigUint;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::timeout;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

const P1: &str = "QmdfTbBqBPQ7VNxZEYEj14VmRuZBkqFbiwReogJgS1zR1n";
const P2: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

/// What the module saw when it consumed a store payload.
#[derive(Debug)]
enum Received {
    Bytes(Vec<u8>),
    Error(String),
}

struct FakeModule {
    received: Mutex<Option<Received>>,
    finished: Notify,
    updates: Vec<DealUpdate>,
}

impl FakeModule {
    fn new(updates: Vec<DealUpdate>) -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(None),
            finished: Notify::new(),
            updates,
        })
    }
}

#[async_trait]
impl DealsModule for FakeModule {
    async fn store(
        &self,
        _cancel: CancellationToken,
        address: &str,
        mut payload: Payload,
        deal_configs: Vec<DealConfig>,
        _duration: u64,
    ) -> Result<StoreOutcome, DealsError> {
        let mut data = Vec::new();
        let read = payload.read_to_end(&mut data).await;
        let result = match read {
            Ok(_) => {
                *self.received.lock().unwrap() = Some(Received::Bytes(data));
                let failed_deals = deal_configs.into_iter().skip(1).collect();
                Ok(StoreOutcome {
                    cids: vec![P1.parse().unwrap()],
                    failed_deals,
                })
            }
            Err(err) => {
                *self.received.lock().unwrap() = Some(Received::Error(err.to_string()));
                Err(DealsError::Payload(err))
            }
        };
        assert_eq!(address, "t3payer");
        self.finished.notify_one();
        result
    }

    async fn watch(
        &self,
        _cancel: CancellationToken,
        _proposals: Vec<Cid>,
    ) -> Result<DealUpdateStream, DealsError> {
        let updates: Vec<Result<DealUpdate, DealsError>> =
            self.updates.iter().cloned().map(Ok).collect();
        Ok(futures::stream::iter(updates).boxed())
    }
}

struct StaticAsks;

#[async_trait]
impl AskIndex for StaticAsks {
    async fn available_asks(&self, query: AskQuery) -> Result<Vec<StorageAsk>, AskIndexError> {
        Ok(vec![StorageAsk {
            price: query.max_price,
            min_piece_size: query.piece_size,
            miner: "f01000".to_string(),
            timestamp: 42,
            expiry: 4242,
        }])
    }
}

/// Serve the deals API on an ephemeral local port.
async fn spawn_server(module: Arc<FakeModule>) -> (SocketAddr, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let service = DealsApiService::new(module, Arc::new(StaticAsks), 1);
    let service_shutdown = service.shutdown_token();
    let token = shutdown.clone();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(service.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                token.cancelled().await;
                service_shutdown.cancel();
            })
            .await
            .unwrap();
    });

    (addr, shutdown)
}

async fn client(addr: SocketAddr) -> DealsClient {
    DealsClient::connect(format!("http://{}", addr)).await.unwrap()
}

fn params(miners: &[&str]) -> StoreParams {
    StoreParams {
        address: "t3payer".to_string(),
        deal_configs: miners
            .iter()
            .map(|m| DealConfig::new(*m, BigUint::from(1_000u32)))
            .collect(),
        duration: 1000,
    }
}

#[tokio::test]
async fn test_store_streams_large_payload_intact() {
    let module = FakeModule::new(Vec::new());
    let (addr, shutdown) = spawn_server(module.clone()).await;

    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let mut client = client(addr).await.with_chunk_size(4096);

    let outcome = client
        .store(&params(&["f01000", "f02000"]), std::io::Cursor::new(payload.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.cids.len(), 1);
    assert_eq!(outcome.cids[0].to_string(), P1);
    assert_eq!(outcome.failed_deals.len(), 1);
    assert_eq!(outcome.failed_deals[0].miner, "f02000");
    assert_eq!(outcome.failed_deals[0].epoch_price, BigUint::from(1_000u32));
    match module.received.lock().unwrap().take() {
        Some(Received::Bytes(data)) => assert_eq!(data, payload),
        other => panic!("module should have read the whole payload, got {:?}", other),
    }

    shutdown.cancel();
}

#[tokio::test]
async fn test_store_read_failure_aborts_upload() {
    let module = FakeModule::new(Vec::new());
    let (addr, shutdown) = spawn_server(module.clone()).await;

    let chunks = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"partial payload")),
        Err(std::io::Error::other("disk went away")),
    ]);
    let reader = StreamReader::new(chunks);

    let finished = module.finished.notified();
    let mut client = client(addr).await;
    let err = client.store(&params(&["f01000"]), reader).await.unwrap_err();
    assert!(format!("{:#}", err).contains("disk went away"));

    timeout(Duration::from_secs(2), finished)
        .await
        .expect("module should finish the aborted store");
    match module.received.lock().unwrap().take() {
        Some(Received::Error(_)) => {}
        other => panic!("module must not see a clean end of payload, got {:?}", other),
    }

    shutdown.cancel();
}

#[tokio::test]
async fn test_watch_streams_until_module_completes() {
    let updates = [(P1, 3u64), (P2, 5), (P1, 7)]
        .iter()
        .map(|(proposal, state_id)| DealUpdate {
            proposal_cid: proposal.parse().unwrap(),
            state_id: *state_id,
            state_name: format!("state-{}", state_id),
            miner: "f01000".to_string(),
            piece_ref: b"piece".to_vec(),
            size: 2048,
            price_per_epoch: BigUint::from(10u32),
            duration: 1000,
        })
        .collect();
    let module = FakeModule::new(updates);
    let (addr, shutdown) = spawn_server(module).await;

    let mut client = client(addr).await;
    let proposals: Vec<Cid> = vec![P1.parse().unwrap(), P2.parse().unwrap()];
    let stream = client.watch(&proposals).await.unwrap();

    let seen: Vec<(String, u64)> = timeout(Duration::from_secs(2), stream.collect::<Vec<_>>())
        .await
        .expect("watch should end when the module completes")
        .into_iter()
        .map(|u| {
            let u = u.unwrap();
            (u.proposal_cid.to_string(), u.state_id)
        })
        .collect();

    assert_eq!(
        seen,
        vec![
            (P1.to_string(), 3),
            (P2.to_string(), 5),
            (P1.to_string(), 7)
        ]
    );

    shutdown.cancel();
}

#[tokio::test]
async fn test_available_asks_round_trip() {
    let (addr, shutdown) = spawn_server(FakeModule::new(Vec::new())).await;
    let mut client = client(addr).await;

    let asks = client
        .available_asks(AskQuery {
            max_price: 900,
            piece_size: 1024,
            limit: 10,
            offset: 0,
        })
        .await
        .unwrap();

    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].price, 900);
    assert_eq!(asks[0].min_piece_size, 1024);
    assert_eq!(asks[0].expiry, 4242);

    shutdown.cancel();
}
