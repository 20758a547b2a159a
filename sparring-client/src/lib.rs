//! ## sparring-client
//! **One simulated TCP client**
//!
//! A `ClientConnection` is a cheap handle onto an actor task that owns the
//! socket exclusively. The handle turns `connect`, `write` and `disconnect`
//! into commands; the actor processes them in order, alongside the read loop
//! and the keepalive timer, and records everything it observes.
//!
//! Nothing the actor does can fail the caller: I/O errors are logged,
//! recorded, and end in `Disconnected`.

mod actor;
mod connection;
mod options;

pub use connection::{ClientConnection, FinishError};
pub use options::ConnectionOptions;
