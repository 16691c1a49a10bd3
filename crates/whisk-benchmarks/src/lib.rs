//! Whisk benchmarking suite
//!
//! Benchmarks for the hot paths: requirement parsing, specifier
//! matching, and graph resolution.

pub mod common;

pub use common::*;
