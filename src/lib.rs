//! Repodeck: repository management dashboard core.
//!
//! This crate holds the deferred push scheduler behind the dashboard: it
//! accepts requests to push, push tags, push a single tag, or push a commit
//! at a future time, keeps them durable across restarts, and records how
//! each one ended.
//!
//! # Architecture
//!
//! Repodeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, git, etc.)
//!
//! # Modules
//!
//! - [`schedule`]: Scheduled task lifecycle, timers, and push strategies
//! - [`config`]: Scheduler daemon configuration

pub mod config;
pub mod schedule;
