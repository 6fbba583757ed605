//! Feedgate Core
//!
//! Core domain types, traits, and error handling for Feedgate.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across all other crates.

pub mod dataset;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod ports;
pub mod schedule;

pub use dataset::{DatasetId, DatasetPolicy, DatasetRequest, NaturalKey};
pub use envelope::{Envelope, Source};
pub use error::{Error, Result};
pub use schedule::{PublicationSchedule, TimeBucket};
