//! Resumable wrappers for FreeSurfer's `recon-all` and `mri_ca_label`.
//!
//! When `recon-all` is re-run on a subject it has already processed, most
//! stages are up to date. This crate inspects the subject directory and appends
//! `-no<step>` flags for stages whose outputs are newer than their inputs, or
//! replaces the invocation with a no-op when nothing is left to do. It also
//! lists the posterior probability maps `mri_ca_label -write_probs` produces.
//!
//! - **[`core`]**: Pure, deterministic logic (step tables, selection, resume
//!   planning). No I/O.
//! - **[`io`]**: Side-effecting operations (modification times, expert files,
//!   config, subprocesses).
//!
//! [`recon_all`] and [`ca_label`] combine the two for each tool.

pub mod ca_label;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod recon_all;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
