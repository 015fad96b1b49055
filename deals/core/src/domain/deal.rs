// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deal value objects exchanged with the deals module.
//!
//! Prices are arbitrary-precision (`BigUint`, attoFIL per epoch). The wire
//! carries them as `uint64`; narrowing happens only in
//! `crate::presentation::grpc::translate` and is checked there.

pub use cid::Cid;
use num_bigint::BigUint;

/// Amount of attoFIL. Never negative.
pub type TokenAmount = BigUint;

/// Target of a storage deal: a provider and the price it is offered per epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DealConfig {
    pub miner: String,
    pub epoch_price: TokenAmount,
}

impl DealConfig {
    pub fn new(miner: impl Into<String>, epoch_price: impl Into<TokenAmount>) -> Self {
        Self {
            miner: miner.into(),
            epoch_price: epoch_price.into(),
        }
    }
}

/// Successful outcome of a store call.
///
/// `failed_deals` lists the deal configs the module could not place while the
/// call as a whole succeeded; it is independent of `cids`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOutcome {
    pub cids: Vec<Cid>,
    pub failed_deals: Vec<DealConfig>,
}

/// Parameters of one store call, carried by the first message of a Store stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreParams {
    /// Wallet address paying for the deals
    pub address: String,
    pub deal_configs: Vec<DealConfig>,
    /// Deal duration in epochs
    pub duration: u64,
}

/// Status change of a watched deal proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealUpdate {
    pub proposal_cid: Cid,
    pub state_id: u64,
    pub state_name: String,
    pub miner: String,
    pub piece_ref: Vec<u8>,
    pub size: u64,
    pub price_per_epoch: TokenAmount,
    pub duration: u64,
}
