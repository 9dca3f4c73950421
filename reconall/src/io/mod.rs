//! Filesystem and process side effects for the wrappers.

pub mod config;
pub mod expert;
pub mod freshness;
pub mod process;
pub mod runner;
