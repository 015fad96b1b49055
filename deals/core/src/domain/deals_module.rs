// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deals Module Trait - Anti-Corruption Layer for the storage deals module
//!
//! The module forms, publishes and tracks storage deals. This crate reaches it
//! only through [`DealsModule`], which keeps the gRPC boundary testable with
//! in-memory fakes.
//!
//! Every call receives a [`CancellationToken`] scoped to the RPC that caused
//! it. The token is cancelled when the RPC ends for any reason, including the
//! client going away; implementations should stop work and release resources
//! once it fires.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::domain::deal::{Cid, DealConfig, DealUpdate, StoreOutcome};

/// Payload handed to a store call. Reading it yields the bytes in the order
/// the client sent them; a read error means the upload was interrupted.
pub type Payload = Box<dyn AsyncRead + Send + Unpin>;

/// Live subscription to deal status updates. Dropping it releases the
/// subscription.
pub type DealUpdateStream = BoxStream<'static, Result<DealUpdate, DealsError>>;

#[async_trait]
pub trait DealsModule: Send + Sync {
    /// Store `payload` and make the configured deals for it.
    ///
    /// # Returns
    /// * `Ok(StoreOutcome)` with the stored content identifiers and the deal
    ///   configs that could not be placed
    /// * `Err(DealsError)` if the call failed as a whole, including when the
    ///   payload could not be read to the end
    async fn store(
        &self,
        cancel: CancellationToken,
        address: &str,
        payload: Payload,
        deal_configs: Vec<DealConfig>,
        duration: u64,
    ) -> Result<StoreOutcome, DealsError>;

    /// Subscribe to status updates of `proposals`.
    ///
    /// The stream ends when the module has nothing more to report, e.g. all
    /// watched deals reached a terminal state.
    async fn watch(
        &self,
        cancel: CancellationToken,
        proposals: Vec<Cid>,
    ) -> Result<DealUpdateStream, DealsError>;
}

#[derive(Debug, Error)]
pub enum DealsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Payload stream failed: {0}")]
    Payload(#[from] std::io::Error),

    #[error("Deal proposal not found: {0}")]
    ProposalNotFound(Cid),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deals module unavailable: {0}")]
    Unavailable(String),

    #[error("Deals module error: {0}")]
    Internal(String),
}
