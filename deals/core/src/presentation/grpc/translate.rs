// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wire <-> domain translation for the deals API.
//!
//! Prices are `BigUint` in the domain and `uint64` on the wire. Widening is
//! exact. Narrowing is checked: a price above `u64::MAX` is rejected with
//! [`TranslateError::PriceOverflow`] (gRPC `OUT_OF_RANGE`), never truncated.

use num_bigint::BigUint;
use thiserror::Error;
use tonic::Status;

use super::proto;
use crate::domain::ask::{AskIndexError, AskQuery, StorageAsk};
use crate::domain::deal::{Cid, DealConfig, DealUpdate, StoreOutcome, StoreParams, TokenAmount};
use crate::domain::deals_module::DealsError;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{field} {value} exceeds the uint64 wire range")]
    PriceOverflow { field: &'static str, value: BigUint },

    #[error("Invalid content identifier '{value}': {reason}")]
    InvalidCid { value: String, reason: String },

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl From<TranslateError> for Status {
    fn from(err: TranslateError) -> Self {
        match &err {
            TranslateError::PriceOverflow { .. } => Status::out_of_range(err.to_string()),
            TranslateError::InvalidCid { .. } | TranslateError::MissingField(_) => {
                Status::invalid_argument(err.to_string())
            }
        }
    }
}

impl From<DealsError> for Status {
    fn from(err: DealsError) -> Self {
        let message = err.to_string();
        match err {
            DealsError::InvalidArgument(_) => Status::invalid_argument(message),
            DealsError::Payload(_) => Status::aborted(message),
            DealsError::ProposalNotFound(_) => Status::not_found(message),
            DealsError::Cancelled => Status::cancelled(message),
            DealsError::Unavailable(_) => Status::unavailable(message),
            DealsError::Internal(_) => Status::internal(message),
        }
    }
}

impl From<AskIndexError> for Status {
    fn from(err: AskIndexError) -> Self {
        let message = err.to_string();
        match err {
            AskIndexError::InvalidQuery(_) => Status::invalid_argument(message),
            AskIndexError::Unavailable(_) => Status::unavailable(message),
            AskIndexError::Internal(_) => Status::internal(message),
        }
    }
}

// --- Prices ---

pub fn price_from_wire(value: u64) -> TokenAmount {
    BigUint::from(value)
}

pub fn price_to_wire(field: &'static str, value: &TokenAmount) -> Result<u64, TranslateError> {
    u64::try_from(value).map_err(|_| TranslateError::PriceOverflow {
        field,
        value: value.clone(),
    })
}

// --- Content identifiers ---

pub fn parse_cid(value: &str) -> Result<Cid, TranslateError> {
    value.parse::<Cid>().map_err(|e| TranslateError::InvalidCid {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Decode Watch proposals, failing on the first malformed one.
pub fn decode_proposals(proposals: &[String]) -> Result<Vec<Cid>, TranslateError> {
    proposals.iter().map(|p| parse_cid(p)).collect()
}

// --- Store ---

pub fn deal_config_from_wire(config: proto::DealConfig) -> DealConfig {
    DealConfig {
        miner: config.miner,
        epoch_price: price_from_wire(config.epoch_price),
    }
}

pub fn deal_config_to_wire(config: &DealConfig) -> Result<proto::DealConfig, TranslateError> {
    Ok(proto::DealConfig {
        miner: config.miner.clone(),
        epoch_price: price_to_wire("epoch_price", &config.epoch_price)?,
    })
}

pub fn store_params_from_wire(params: proto::StoreParams) -> StoreParams {
    StoreParams {
        address: params.address,
        deal_configs: params
            .deal_configs
            .into_iter()
            .map(deal_config_from_wire)
            .collect(),
        duration: params.duration,
    }
}

pub fn store_params_to_wire(params: &StoreParams) -> Result<proto::StoreParams, TranslateError> {
    Ok(proto::StoreParams {
        address: params.address.clone(),
        deal_configs: params
            .deal_configs
            .iter()
            .map(deal_config_to_wire)
            .collect::<Result<_, _>>()?,
        duration: params.duration,
    })
}

pub fn store_reply(outcome: &StoreOutcome) -> Result<proto::StoreReply, TranslateError> {
    Ok(proto::StoreReply {
        cids: outcome.cids.iter().map(|c| c.to_string()).collect(),
        failed_deals: outcome
            .failed_deals
            .iter()
            .map(deal_config_to_wire)
            .collect::<Result<_, _>>()?,
    })
}

pub fn store_outcome_from_wire(reply: proto::StoreReply) -> Result<StoreOutcome, TranslateError> {
    Ok(StoreOutcome {
        cids: reply
            .cids
            .iter()
            .map(|c| parse_cid(c))
            .collect::<Result<_, _>>()?,
        failed_deals: reply
            .failed_deals
            .into_iter()
            .map(deal_config_from_wire)
            .collect(),
    })
}

// --- Watch ---

pub fn watch_reply(update: DealUpdate) -> Result<proto::WatchReply, TranslateError> {
    let price_per_epoch = price_to_wire("price_per_epoch", &update.price_per_epoch)?;
    Ok(proto::WatchReply {
        deal_info: Some(proto::DealInfo {
            proposal_cid: update.proposal_cid.to_string(),
            state_id: update.state_id,
            state_name: update.state_name,
            miner: update.miner,
            piece_ref: update.piece_ref,
            size: update.size,
            price_per_epoch,
            duration: update.duration,
        }),
    })
}

pub fn deal_update_from_wire(reply: proto::WatchReply) -> Result<DealUpdate, TranslateError> {
    let info = reply
        .deal_info
        .ok_or(TranslateError::MissingField("deal_info"))?;
    Ok(DealUpdate {
        proposal_cid: parse_cid(&info.proposal_cid)?,
        state_id: info.state_id,
        state_name: info.state_name,
        miner: info.miner,
        piece_ref: info.piece_ref,
        size: info.size,
        price_per_epoch: price_from_wire(info.price_per_epoch),
        duration: info.duration,
    })
}

// --- Asks ---

/// An absent query is the all-zero query.
pub fn ask_query_from_wire(query: Option<proto::Query>) -> AskQuery {
    let query = query.unwrap_or_default();
    AskQuery {
        max_price: query.max_price,
        piece_size: query.piece_size,
        limit: query.limit,
        offset: query.offset,
    }
}

pub fn ask_query_to_wire(query: AskQuery) -> proto::Query {
    proto::Query {
        max_price: query.max_price,
        piece_size: query.piece_size,
        limit: query.limit,
        offset: query.offset,
    }
}

pub fn storage_ask_to_wire(ask: StorageAsk) -> proto::StorageAsk {
    proto::StorageAsk {
        price: ask.price,
        min_piece_size: ask.min_piece_size,
        miner: ask.miner,
        timestamp: ask.timestamp,
        expiry: ask.expiry,
    }
}

pub fn storage_ask_from_wire(ask: proto::StorageAsk) -> StorageAsk {
    StorageAsk {
        price: ask.price,
        min_piece_size: ask.min_piece_size,
        miner: ask.miner,
        timestamp: ask.timestamp,
        expiry: ask.expiry,
    }
}
