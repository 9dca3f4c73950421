//! Deterministic, pure logic for building `recon-all` resume invocations.
//!
//! Core modules are free of I/O side effects. Anything that needs the
//! filesystem (modification times, expert files) lives in [`crate::io`] and is
//! reached through traits such as [`resume::Freshness`].

pub mod cmdline;
pub mod directive;
pub mod resume;
pub mod selector;
pub mod steps;
