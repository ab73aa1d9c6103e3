//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod mirror;
pub mod time;

pub use mirror::{InMemoryMirror, JsonFileMirror};
pub use time::{FixedTimeSource, SystemTimeSource};
