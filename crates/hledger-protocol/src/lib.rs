//! JSON-RPC/LSP protocol types and capability configuration.

#![deny(unsafe_code)]

mod capabilities;
mod jsonrpc;
pub mod methods;

pub use capabilities::{server_capabilities, FeatureToggles};
pub use jsonrpc::{error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
