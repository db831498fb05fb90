//! Live sessions and their registry.
//!
//! A [`Session`] pairs one interpreter process with one control client for a
//! project root. The [`SessionRegistry`] is owned by the host; nothing else
//! holds sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fsi_protocol::{DocumentId, SessionId};
use fsi_runtime::{ControlClient, Handshake, HandshakeState, InterpreterDescriptor, ProcessHandle};

/// One interpreter process and its control channel.
#[derive(Debug)]
pub struct Session {
	pub id: SessionId,
	pub root: PathBuf,
	pub origin: Option<DocumentId>,
	pub interpreter: InterpreterDescriptor,
	pub bridge_script: PathBuf,
	pub client: ControlClient,
	pub handshake: Handshake,
	pub attached: bool,
	process: Option<ProcessHandle>,
}

impl Session {
	pub fn new(
		client: ControlClient,
		root: PathBuf,
		origin: Option<DocumentId>,
		interpreter: InterpreterDescriptor,
		bridge_script: PathBuf,
	) -> Self {
		Self {
			id: client.session(),
			root,
			origin,
			interpreter,
			bridge_script,
			client,
			handshake: Handshake::new(),
			attached: false,
			process: None,
		}
	}

	pub fn state(&self) -> HandshakeState {
		self.handshake.state()
	}

	pub fn is_connected(&self) -> bool {
		self.handshake.is_connected()
	}

	pub fn has_process(&self) -> bool {
		self.process.is_some()
	}

	/// Records the spawned process. A session owns at most one.
	pub fn attach_process(&mut self, process: ProcessHandle) {
		if let Some(mut previous) = self.process.replace(process) {
			previous.kill();
		}
		self.handshake.spawned();
	}

	/// Kills the process if one is still tracked.
	pub fn kill(&mut self) -> bool {
		self.process.take().is_some_and(|mut process| process.kill())
	}
}

/// Sessions by id, with a project-root index.
#[derive(Debug, Default)]
pub struct SessionRegistry {
	sessions: HashMap<SessionId, Session>,
	by_root: HashMap<PathBuf, SessionId>,
	last_id: u64,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocates a fresh session id.
	pub fn next_id(&mut self) -> SessionId {
		self.last_id += 1;
		SessionId(self.last_id)
	}

	/// Inserts `session`, returning any session it displaced for the same root.
	pub fn insert(&mut self, session: Session) -> Option<Session> {
		let displaced = self
			.by_root
			.insert(session.root.clone(), session.id)
			.filter(|id| *id != session.id)
			.and_then(|id| self.sessions.remove(&id));
		self.sessions.insert(session.id, session);
		displaced
	}

	pub fn get(&self, id: SessionId) -> Option<&Session> {
		self.sessions.get(&id)
	}

	pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
		self.sessions.get_mut(&id)
	}

	pub fn find_by_root(&self, root: &Path) -> Option<&Session> {
		self.by_root.get(root).and_then(|id| self.sessions.get(id))
	}

	pub fn remove(&mut self, id: SessionId) -> Option<Session> {
		let session = self.sessions.remove(&id)?;
		if self.by_root.get(&session.root) == Some(&id) {
			self.by_root.remove(&session.root);
		}
		Some(session)
	}

	pub fn contains(&self, id: SessionId) -> bool {
		self.sessions.contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}

	/// True while any session is still waiting for its handshake.
	pub fn any_connecting(&self) -> bool {
		self.sessions.values().any(|s| {
			matches!(s.state(), HandshakeState::Spawning | HandshakeState::Connecting)
		})
	}

	pub fn ids(&self) -> Vec<SessionId> {
		let mut ids: Vec<_> = self.sessions.keys().copied().collect();
		ids.sort();
		ids
	}

	pub fn iter(&self) -> impl Iterator<Item = &Session> {
		self.sessions.values()
	}
}

#[cfg(test)]
mod tests {
	use fsi_runtime::{ControlServer, event_channel};
	use tokio::sync::oneshot;

	use super::*;

	fn descriptor() -> InterpreterDescriptor {
		InterpreterDescriptor {
			command: fsi_runtime::command_name(),
			executable: PathBuf::from("/usr/bin/fsharpi"),
		}
	}

	fn session(server: &ControlServer, id: SessionId, root: &str) -> Session {
		Session::new(
			server.open(id),
			PathBuf::from(root),
			Some(DocumentId(1)),
			descriptor(),
			PathBuf::from("/opt/bridge.fsx"),
		)
	}

	#[test]
	fn ids_are_unique_and_increasing() {
		let mut registry = SessionRegistry::new();
		let a = registry.next_id();
		let b = registry.next_id();
		assert!(b > a);
	}

	#[tokio::test]
	async fn lookup_by_root() {
		let (events, _rx) = event_channel();
		let server = ControlServer::bind(events).await.unwrap();
		let mut registry = SessionRegistry::new();
		let id = registry.next_id();

		assert!(registry.insert(session(&server, id, "/proj")).is_none());
		assert_eq!(registry.find_by_root(Path::new("/proj")).map(|s| s.id), Some(id));
		assert!(registry.find_by_root(Path::new("/other")).is_none());

		let removed = registry.remove(id).unwrap();
		assert_eq!(removed.id, id);
		assert!(registry.is_empty());
		assert!(registry.find_by_root(Path::new("/proj")).is_none());
	}

	#[tokio::test]
	async fn insert_displaces_previous_session_for_root() {
		let (events, _rx) = event_channel();
		let server = ControlServer::bind(events).await.unwrap();
		let mut registry = SessionRegistry::new();
		let first = registry.next_id();
		let second = registry.next_id();

		registry.insert(session(&server, first, "/proj"));
		let displaced = registry.insert(session(&server, second, "/proj")).unwrap();

		assert_eq!(displaced.id, first);
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.ids(), vec![second]);
	}

	#[tokio::test]
	async fn attaching_process_starts_connecting() {
		let (events, _rx) = event_channel();
		let server = ControlServer::bind(events).await.unwrap();
		let mut registry = SessionRegistry::new();
		let id = registry.next_id();
		registry.insert(session(&server, id, "/proj"));
		assert!(registry.any_connecting());

		let (tx, mut rx) = oneshot::channel();
		let entry = registry.get_mut(id).unwrap();
		entry.attach_process(ProcessHandle::new(id, None, tx));
		assert_eq!(entry.state(), HandshakeState::Connecting);

		entry.handshake.on_stdout("Connected");
		assert!(!registry.any_connecting());

		assert!(registry.get_mut(id).unwrap().kill());
		assert!(rx.try_recv().is_ok());
		assert!(!registry.get(id).unwrap().has_process());
	}
}
