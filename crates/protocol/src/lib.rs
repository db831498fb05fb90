//! Wire types for the F# interactive bridge channel.
//!
//! The host and the bridge script running inside `fsi`/`fsharpi` talk over a
//! single TCP connection per session, one JSON record per line. This crate
//! holds the shapes of those records and nothing else:
//!
//! - **Identifiers**: [`SessionId`], [`DocumentId`], [`WatchId`]
//! - **Positions**: [`Cursor`], [`LineRange`], [`ResponseMeta`]
//! - **Outbound**: [`Hello`] (sent by the bridge on attach), [`EvalRequest`]
//! - **Inbound**: [`Inbound`] wrapping the closed [`EvalResponse`] sum type
//!
//! Behaviour lives in `fsi-runtime` and `fsi-session`.

pub mod message;
pub mod types;

pub use message::*;
pub use types::*;
