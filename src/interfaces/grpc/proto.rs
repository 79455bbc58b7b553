//! Protobuf messages and service stubs for `proto/user_service.proto`.
//!
//! The code is pre-generated so building the crate needs no `protoc`.

#![allow(clippy::all)]
#![allow(missing_docs)]

include!("generated/user_service.rs");
