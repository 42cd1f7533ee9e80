//! CLI command implementations.

pub mod columns;
pub mod init;
pub mod process;
