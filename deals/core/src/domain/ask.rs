// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ask Index Trait - read access to published storage asks
//!
//! The index itself (crawling miners, caching asks) lives outside this crate;
//! the gRPC layer only reads from it.

use async_trait::async_trait;
use thiserror::Error;

/// Filter for available asks.
///
/// Fields are forwarded verbatim. A zero `limit` or `offset` means whatever
/// the index defines for zero; no default is substituted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AskQuery {
    pub max_price: u64,
    pub piece_size: u64,
    pub limit: u32,
    pub offset: u32,
}

/// A storage provider's published offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAsk {
    pub price: u64,
    pub min_piece_size: u64,
    pub miner: String,
    pub timestamp: u64,
    pub expiry: u64,
}

#[async_trait]
pub trait AskIndex: Send + Sync {
    /// Return the asks matching `query`.
    async fn available_asks(&self, query: AskQuery) -> Result<Vec<StorageAsk>, AskIndexError>;
}

#[derive(Debug, Error)]
pub enum AskIndexError {
    #[error("Invalid ask query: {0}")]
    InvalidQuery(String),

    #[error("Ask index unavailable: {0}")]
    Unavailable(String),

    #[error("Ask index error: {0}")]
    Internal(String),
}
