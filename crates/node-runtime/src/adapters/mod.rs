//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports each subsystem declares,
//! built on the configured feed and the shared mempool tracker.
//!
//! | Port | Owner | Adapter |
//! |------|-------|---------|
//! | `HeaderSource` | bc-01 | `FeedSource` |
//! | `MempoolSource` | bc-02 | `FeedSource` |
//! | `CatchUpSource` | bc-04 | `LiveCatchUp` |

pub mod catch_up;
pub mod feed_source;

pub use catch_up::LiveCatchUp;
pub use feed_source::FeedSource;
