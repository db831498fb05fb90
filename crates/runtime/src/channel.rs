//! TCP control channel between the host and bridge scripts.
//!
//! One [`ControlServer`] listens on loopback for every session. Before a
//! process is spawned the host opens a [`ControlClient`] for the session id it
//! is about to pass on the command line; requests sent through it queue until
//! the bridge dials in and greets with [`Hello`], then flow over that
//! connection. Removing the session closes the queue so later sends fail.
//!
//! ```text
//! host ── EvalRequest ──▶ queue ──▶ writer task ──▶ socket ──▶ bridge
//! host ◀── SessionEvent ◀── reader task ◀── Inbound ◀── socket ◀──┘
//! ```

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use fsi_protocol::{EvalRequest, Hello, Inbound, SessionId};
use parking_lot::Mutex;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventSender, SessionEvent, SessionEventKind};
use crate::transport::{read_frame, write_frame};

/// Open/closed state shared by a client, its slot, and its writer task.
#[derive(Debug)]
struct Lifeline {
	open: AtomicBool,
	closed: Notify,
}

impl Lifeline {
	fn new() -> Arc<Self> {
		Arc::new(Self {
			open: AtomicBool::new(true),
			closed: Notify::new(),
		})
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::Acquire)
	}

	fn close(&self) {
		self.open.store(false, Ordering::Release);
		self.closed.notify_waiters();
	}

	/// Resolves once closed. Interest is registered before the flag is read,
	/// so a close racing with the call is not missed.
	async fn wait_closed(&self) {
		let notified = self.closed.notified();
		tokio::pin!(notified);
		notified.as_mut().enable();
		if !self.is_open() {
			return;
		}
		notified.await;
	}
}

#[derive(Debug)]
struct Slot {
	/// Taken by the writer task when the bridge attaches.
	queue: Option<mpsc::UnboundedReceiver<EvalRequest>>,
	lifeline: Arc<Lifeline>,
}

type Slots = Arc<DashMap<SessionId, Slot>>;

/// Sending half of one session's control channel.
#[derive(Debug, Clone)]
pub struct ControlClient {
	session: SessionId,
	tx: mpsc::UnboundedSender<EvalRequest>,
	lifeline: Arc<Lifeline>,
}

impl ControlClient {
	pub fn session(&self) -> SessionId {
		self.session
	}

	pub fn is_open(&self) -> bool {
		self.lifeline.is_open()
	}

	/// Queues a request. Never waits for the bridge.
	pub fn send(&self, request: EvalRequest) -> Result<()> {
		if !self.is_open() {
			return Err(Error::ChannelClosed(self.session));
		}
		self.tx
			.send(request)
			.map_err(|_| Error::ChannelClosed(self.session))
	}
}

/// Loopback listener shared by all sessions.
#[derive(Debug)]
pub struct ControlServer {
	port: u16,
	slots: Slots,
	accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ControlServer {
	/// Binds an ephemeral loopback port and starts accepting bridges.
	pub async fn bind(events: EventSender) -> Result<Self> {
		let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
		let port = listener.local_addr()?.port();
		let slots: Slots = Arc::new(DashMap::new());

		info!(target = "fsi", port, "control channel listening");
		let accept_task = tokio::spawn(accept_loop(listener, slots.clone(), events));

		Ok(Self {
			port,
			slots,
			accept_task: Mutex::new(Some(accept_task)),
		})
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// Creates the client for `session`, replacing any previous one.
	pub fn open(&self, session: SessionId) -> ControlClient {
		let (tx, rx) = mpsc::unbounded_channel();
		let lifeline = Lifeline::new();
		let previous = self.slots.insert(
			session,
			Slot {
				queue: Some(rx),
				lifeline: lifeline.clone(),
			},
		);
		if let Some(previous) = previous {
			previous.lifeline.close();
		}
		ControlClient { session, tx, lifeline }
	}

	/// Removes a session's client. Pending and future sends fail and an
	/// attached bridge connection is shut down.
	pub fn remove(&self, session: SessionId) -> bool {
		match self.slots.remove(&session) {
			Some((_, slot)) => {
				slot.lifeline.close();
				debug!(target = "fsi", %session, "control client removed");
				true
			}
			None => false,
		}
	}

	pub fn contains(&self, session: SessionId) -> bool {
		self.slots.contains_key(&session)
	}

	/// Stops accepting new bridges. Existing connections are unaffected.
	pub fn shutdown(&self) {
		if let Some(task) = self.accept_task.lock().take() {
			task.abort();
		}
	}
}

impl Drop for ControlServer {
	fn drop(&mut self) {
		self.shutdown();
		for slot in self.slots.iter() {
			slot.lifeline.close();
		}
	}
}

async fn accept_loop(listener: TcpListener, slots: Slots, events: EventSender) {
	loop {
		match listener.accept().await {
			Ok((stream, peer)) => {
				debug!(target = "fsi", %peer, "bridge connected");
				tokio::spawn(serve_bridge(stream, slots.clone(), events.clone()));
			}
			Err(err) => {
				warn!(target = "fsi", error = %err, "accept failed");
				tokio::time::sleep(Duration::from_millis(50)).await;
			}
		}
	}
}

async fn serve_bridge(stream: TcpStream, slots: Slots, events: EventSender) {
	let (read, write) = stream.into_split();
	let mut reader = BufReader::new(read);
	let mut line = String::new();

	let hello: Hello = match read_frame(&mut reader, &mut line).await {
		Ok(Some(hello)) => hello,
		Ok(None) => return,
		Err(err) => {
			warn!(target = "fsi", error = %err, "bad bridge greeting");
			return;
		}
	};
	let session = hello.session;

	let claimed = slots.get_mut(&session).and_then(|mut slot| {
		let lifeline = slot.lifeline.clone();
		slot.queue.take().map(|queue| (queue, lifeline))
	});
	let Some((queue, lifeline)) = claimed else {
		warn!(target = "fsi", %session, "bridge greeted with unknown or attached session");
		return;
	};

	let emit = |kind| {
		if events.send(SessionEvent::new(session, kind)).is_err() {
			debug!(target = "fsi", %session, "event receiver gone");
		}
	};

	emit(SessionEventKind::Attached);
	let writer = tokio::spawn(write_loop(session, write, queue, lifeline.clone()));
	read_loop(session, &mut reader, &lifeline, &emit).await;
	writer.abort();
	emit(SessionEventKind::Detached);
}

async fn read_loop<F>(
	session: SessionId,
	reader: &mut BufReader<OwnedReadHalf>,
	lifeline: &Lifeline,
	emit: &F,
) where
	F: Fn(SessionEventKind),
{
	let mut line = String::new();
	loop {
		let frame = tokio::select! {
			frame = read_frame::<_, Inbound>(reader, &mut line) => frame,
			_ = lifeline.wait_closed() => return,
		};
		match frame {
			Ok(Some(inbound)) => emit(SessionEventKind::Inbound(inbound)),
			Ok(None) => return,
			Err(Error::ProtocolError(msg)) => {
				warn!(target = "fsi", %session, error = %msg, "dropping malformed response");
			}
			Err(err) => {
				debug!(target = "fsi", %session, error = %err, "bridge read failed");
				return;
			}
		}
	}
}

async fn write_loop(
	session: SessionId,
	mut write: OwnedWriteHalf,
	mut queue: mpsc::UnboundedReceiver<EvalRequest>,
	lifeline: Arc<Lifeline>,
) {
	loop {
		let request = tokio::select! {
			request = queue.recv() => request,
			_ = lifeline.wait_closed() => None,
		};
		let Some(request) = request else { break };
		if let Err(err) = write_frame(&mut write, &request).await {
			warn!(target = "fsi", %session, error = %err, "failed to write request");
			break;
		}
	}
	let _ = tokio::io::AsyncWriteExt::shutdown(&mut write).await;
}
