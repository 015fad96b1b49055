// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod ingest_pipe;

pub use ingest_pipe::{pipe, PipeReader, PipeWriter};
