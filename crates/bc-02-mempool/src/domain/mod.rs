//! # Domain Layer

pub mod config;
pub mod errors;

pub use config::MempoolConfig;
pub use errors::LookupError;
