//! Deferred push scheduling for registered repositories.
//!
//! A caller asks for a push-family action to run at a future time; the
//! request is validated, persisted, and backed by an in-memory timer. When
//! the timer fires (or at startup, for tasks whose time passed while the
//! process was down) the matching strategy drives the version-control
//! adapter and the terminal outcome is written back. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Per-kind push logic in [`strategies`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod strategies;
