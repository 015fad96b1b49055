// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Streaming gRPC boundary between deal clients and the storage deals module.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Wires the deals domain contracts, the ingest pipe and the gRPC surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
