//! # recipe-deploy-common
//!
//! Shared types, error definitions, action settings, and constants
//! used across the recipe deployment workspace.
//!
//! This crate is the leaf of the dependency graph; it depends on no other
//! internal crate and provides the primitives the pipeline and the CLI
//! build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
