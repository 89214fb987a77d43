//! This crate contains the code that makes the binaries observable. For a
//! one-shot tool like the deployer that is the logging setup and a panic
//! hook that reports through the same log format.
pub mod config;
pub mod tracing;
