//! Typed notifications from interpreter processes and their control channels.
//!
//! Every background task in this crate reports through one unbounded channel
//! of [`SessionEvent`]s. Whoever owns the receiver handles them one at a time,
//! which is what keeps session state single-writer.

use fsi_protocol::{Inbound, SessionId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
	/// Decoded stdout text, in arrival order.
	Stdout(String),
	/// Decoded stderr text, in arrival order.
	Stderr(String),
	/// The process exited. Sent after both output streams reached EOF.
	Exit(Option<i32>),
	/// The bridge dialled in and greeted with this session's id.
	Attached,
	/// A response record from the bridge.
	Inbound(Inbound),
	/// The bridge connection closed.
	Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
	pub session: SessionId,
	pub kind: SessionEventKind,
}

impl SessionEvent {
	pub fn new(session: SessionId, kind: SessionEventKind) -> Self {
		Self { session, kind }
	}
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
	mpsc::unbounded_channel()
}
