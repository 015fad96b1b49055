// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`dealbridge-core`)
//!
//! gRPC surface that translates wire requests into calls on the injected deals
//! module and ask index. **No deal logic lives here**: forming, publishing and
//! tracking deals belongs to the module behind `crate::domain::deals_module`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`grpc`] | gRPC (Tonic) | `DealsApi` service: AvailableAsks, streamed Store, streamed Watch |

pub mod grpc;
