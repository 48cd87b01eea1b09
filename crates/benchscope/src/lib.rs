#![doc = include_str!("../../../README.md")]
//!
//! This crate re-exports the data model and client-side derivations of
//! `benchscope-core` together with the dashboard server.

pub use benchscope_core::*;
pub use benchscope_server as server;
