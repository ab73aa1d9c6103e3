//! # Blockclock Test Suite
//!
//! Cross-subsystem tests that run the real runtime against a scripted
//! node feed.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs       # feed → event pump → cache/mempool → bus → registry
//!     ├── restart.rs     # mirror restore, corrupt mirror, --reset
//!     └── websocket.rs   # full browser sessions over a real socket
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bc-tests
//! cargo test -p bc-tests integration::websocket
//!
//! # Benchmarks
//! cargo bench -p bc-tests
//! ```

pub mod integration;
