//! Read-through resolution policy for Feedgate.
//!
//! One policy governs every dataset endpoint: durable store, then
//! ephemeral cache, then upstream with an optional fallback-bucket
//! retry, with results written back through on the way out.

pub mod resolver;

pub use resolver::{ReadThrough, Resolution};
