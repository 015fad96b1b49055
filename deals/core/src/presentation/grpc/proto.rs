// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Generated protobuf code for `dealbridge.deals.v1`.

tonic::include_proto!("dealbridge.deals.v1");
