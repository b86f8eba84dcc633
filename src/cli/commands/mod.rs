//! CLI command implementations
//!
//! Each command returns its process exit code: 0 on success, 1 for a
//! configuration problem, 5 for anything fatal.

pub mod init;
pub mod migrate;
pub mod serve;
pub mod validate;
