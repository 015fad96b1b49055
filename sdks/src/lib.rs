// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! dealbridge Rust SDK
//!
//! Client for listing storage asks, streaming payloads into storage deals and
//! watching deal status over the dealbridge gRPC API.

pub mod client;

pub use client::{DealsClient, DEFAULT_CHUNK_SIZE};
pub use dealbridge_core::domain::ask::{AskQuery, StorageAsk};
pub use dealbridge_core::domain::deal::{Cid, DealConfig, DealUpdate, StoreOutcome, StoreParams};
