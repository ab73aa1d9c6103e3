//! # Broadcast Dispatcher (bc-04)
//!
//! Serves the browser client and pushes every chain and mempool event to
//! all connected sockets.
//!
//! ## Architecture
//!
//! ```text
//! event bus ──► Dispatcher ──encode once──► SubscriberRegistry
//!                                              │ try_send per socket
//!                                              ▼
//!                              connection task ──► WebSocket
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | 1 | Catch-up Before Live | `registry.rs` - backlog until `Live`, flushed in order |
//! | 2 | Isolated Delivery | `registry.rs` - `try_send`, full queues drop for one socket only |
//! | 3 | Immutable Frames | `domain/frame.rs` - `Frame = Arc<str>` shared by every socket |
//! | 4 | Idempotent Close | `registry.rs` - `transition(Closed)` on an unknown id succeeds |

pub mod connection;
pub mod dispatcher;
pub mod domain;
pub mod ports;
pub mod registry;
pub mod server;

pub use dispatcher::Dispatcher;
pub use domain::{
    BroadcastError, ClientPacket, ConnectionId, ConnectionState, Frame, ServerConfig,
    TransitionError,
};
pub use ports::CatchUpSource;
pub use registry::{DeliveryReport, SubscriberRegistry};
pub use server::{bind, router, serve, AppState};
