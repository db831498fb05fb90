//! Interpreter runtime for F# interactive sessions.
//!
//! This crate owns everything below the editor: finding `fsi`/`fsharpi`,
//! spawning it with the bridge script, watching its output for the
//! connection handshake, and carrying evaluation traffic over the TCP
//! control channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   LaunchSpec    ┌───────────────────────┐
//! │ InterpreterProbe     │ ──────────────▶ │ ProcessSupervisor     │
//! │ ProjectLocator       │                 │ stdout/stderr/exit    │
//! │ locate_bridge_script │                 └──────────┬────────────┘
//! └──────────────────────┘                            │ SessionEvent
//!                                                     ▼
//! ┌──────────────────────┐   SessionEvent  ┌───────────────────────┐
//! │ ControlServer        │ ──────────────▶ │ event receiver        │
//! │ ControlClient (queue)│ ◀────────────── │ (single dispatch task)│
//! └──────────────────────┘   EvalRequest   └───────────────────────┘
//! ```
//!
//! [`Handshake`] is a pure state machine fed by the dispatch task; nothing in
//! here mutates session state on its own.

pub mod bridge;
pub mod channel;
pub mod error;
pub mod events;
pub mod handshake;
pub mod interpreter;
pub mod process;
pub mod project;
pub mod transport;

pub use bridge::{BridgeScript, escape_for_platform, escape_path, locate_bridge_script};
pub use channel::{ControlClient, ControlServer};
pub use error::{Error, Result};
pub use events::{EventReceiver, EventSender, SessionEvent, SessionEventKind, event_channel};
pub use handshake::{CONNECTED_MARKER, ExitOutcome, Handshake, HandshakeState};
pub use interpreter::{InterpreterDescriptor, InterpreterProbe, command_name, resolve_executable};
pub use process::{LaunchSpec, Launcher, ProcessHandle, ProcessSupervisor};
pub use project::{ProjectLocator, find_project_root};
