// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for dealbridge-core
//!
//! Compiles the deals API Protocol Buffer definitions into tonic server and
//! client stubs.
//!
//! # Compilation Targets
//!
//! - `../../proto/dealbridge/deals/v1/deals.proto` - AvailableAsks, Store, Watch
//!
//! Generated code is placed in `OUT_DIR` and included via `tonic::include_proto!`
//! in `src/presentation/grpc/proto.rs`.
//!
//! # Dependencies
//!
//! - **protoc**: Protocol buffer compiler (vendored via `protoc-bin-vendored`)
//! - **tonic-prost-build**: Code generator for Rust gRPC stubs

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set PROTOC environment variable to point to the vendored protoc binary
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    let protos = ["../../proto/dealbridge/deals/v1/deals.proto"];

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&protos, &["../../proto"])?;

    println!("cargo:rerun-if-changed=../../proto/dealbridge/deals/v1/deals.proto");

    Ok(())
}
