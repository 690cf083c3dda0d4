//! # featurize-compose
//!
//! Turns a list of feature names into a project's artifacts.
//!
//! Handles:
//! - **Parser**: Lexing and parsing of Dockerfile snippets, plus lint checks.
//! - **Resolver**: Transitive, deduplicated, dependency-ordered resolution.
//! - **Graph**: Cycle reporting and order checks with `petgraph`.
//! - **Composer**: The generated Dockerfile, with namespaced COPY sources.
//! - **Manifest**: The generated bats test manifest.
//! - **Generate**: Resolution and rendering in one step.
//! - **Project**: The `Featurizefile` and feature list editing.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod composer;
pub mod generate;
pub mod graph;
pub mod manifest;
pub mod parser;
pub mod project;
pub mod resolver;

pub use composer::{Composer, compose};
pub use generate::{Artifacts, Generator, generate};
pub use manifest::write_test_manifest;
pub use project::FeatureSet;
pub use resolver::resolve;
