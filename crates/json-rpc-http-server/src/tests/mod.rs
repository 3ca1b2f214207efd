//! Test modules for the json-rpc-http-server crate

pub mod transport_tests;
