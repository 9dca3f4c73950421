//! Stable exit codes for the `reconall` CLI.

/// Tool succeeded, or a resumed subject had nothing left to run.
pub const OK: i32 = 0;
/// Invalid inputs/config or an error before the tool could run.
pub const INVALID: i32 = 1;
/// The wrapped tool exited non-zero or timed out.
pub const TOOL_FAILED: i32 = 2;
