//! Adapter implementations for the scheduling ports.

pub mod git_cli;
pub mod memory;
pub mod postgres;
