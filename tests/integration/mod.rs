//! Integration tests for cfgtree

mod cli_parse;
mod cli_push_pull;
mod operation_flow;
mod store_properties;
mod sync_roundtrip;
