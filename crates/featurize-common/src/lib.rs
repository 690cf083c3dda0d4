//! # featurize-common
//!
//! Shared feature model, error definitions, configuration and constants
//! used across the entire Featurize workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives that the store, compose and
//! CLI crates build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
