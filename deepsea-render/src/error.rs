//! Return values from fallible calls.
//!
//! The render core shares its error taxonomy with `deepsea-core` — a draw
//! call rejected for `InvalidArgument` and a hash-table insert rejected for
//! `AlreadyExists` are the same kind of failure at different layers, so we
//! re-export rather than mint a second, parallel enum.

pub use deepsea_core::error::{Error, ErrorKind, Result};
