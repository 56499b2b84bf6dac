//! # attest-core
//!
//! The trait seams of the attest audit log.
//!
//! This crate provides:
//! - `AuditLog`: the in-process API decision producers and readers call
//! - `Clock`: the time source stamped onto entries and checkpoints
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_core::traits::{AuditLog, Clock};
//! ```

pub mod traits;

pub use traits::{AuditLog, Clock, SystemClock};
