//! Step definitions for scheduled push behaviour tests.

pub mod then;
pub mod when;
