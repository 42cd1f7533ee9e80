//! Table serialization.

mod writer;

pub use writer::{OutputFormat, TableWriter};
