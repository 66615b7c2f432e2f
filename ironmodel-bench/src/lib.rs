//! # IronModel Bench
//!
//! Benchmarking fixtures for IronModel.

pub mod fixtures;
