// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Deal value objects and the contracts of the external collaborators.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod ask;
pub mod deal;
pub mod deals_module;
pub mod service_config;
