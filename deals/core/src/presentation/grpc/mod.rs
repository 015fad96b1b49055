// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! gRPC service for the deals API and the streaming pieces behind it.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Implements mod

pub mod proto;
pub mod server;
pub mod store;
pub mod translate;
pub mod watch;
