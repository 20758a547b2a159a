//! # sparring-core
//!
//! Shared vocabulary for the harness: the client lifecycle state machine,
//! the error taxonomy for client I/O, the events a client records while it
//! runs and the structured results handed back to the suite driver.
//!
//! ### Key Submodules:
//! - `state`: `ClientState` and its legal transitions
//! - `events`: timestamped client events, per-client reports, case results
//! - `time`: `CaseClock`, the per-case time anchor every timeline derives from

pub mod error;
pub mod events;
pub mod state;
pub mod time;

pub use error::ClientError;
pub use events::{CaseResult, ClientEvent, ClientReport, TimedEvent};
pub use state::ClientState;
pub use time::CaseClock;
