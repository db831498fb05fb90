//! The session host.
//!
//! [`SessionHost`] owns the registry, the control server and the editor-side
//! interfaces, and is the only thing that mutates session state. Process
//! output, channel traffic and user commands all arrive as messages and are
//! handled one at a time by [`SessionHost::step`]; no handler waits on a
//! round trip.

use std::path::{Path, PathBuf};

use fsi_protocol::{DocumentId, EvalInfo, EvalRequest, SessionId};
use fsi_runtime::{
	ControlClient, ControlServer, Error, EventReceiver, EventSender, ExitOutcome, InterpreterProbe,
	LaunchSpec, Launcher, ProcessSupervisor, ProjectLocator, Result, SessionEvent,
	SessionEventKind, event_channel, locate_bridge_script,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::interfaces::{Console, Document, Editor, Notifier, PopupAction};
use crate::notices;
use crate::session::{Session, SessionRegistry};
use crate::settings::{SettingKey, Settings, SettingsStore};
use crate::watch::wrap;

mod dispatch;

pub use dispatch::SUCCESS_GLYPH;

/// Working label shown while an interpreter starts.
pub const WORKING_CONNECTING: &str = "Connecting..";

/// Which part of a document to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalScope {
	/// All watched text.
	Document,
	/// The selection, or the caret position against the watched text.
	One,
}

/// An evaluation detached from its document, code already wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEval {
	pub origin: DocumentId,
	pub path: Option<PathBuf>,
	pub info: EvalInfo,
}

impl PreparedEval {
	pub fn from_document(doc: &dyn Document, scope: EvalScope) -> Self {
		let path = doc.path().map(Path::to_path_buf);
		let mut info = EvalInfo {
			path: path.clone(),
			name: doc.name(),
			..Default::default()
		};

		match scope {
			EvalScope::Document => {
				info.code = doc.watched_range(None, None, &wrap);
			}
			EvalScope::One if doc.has_selection() => {
				info.code = doc.selection_text();
				info.meta = doc.selection_range();
			}
			EvalScope::One => {
				info.pos = Some(doc.cursor_position());
				info.code = doc.watched_range(None, None, &wrap);
			}
		}

		Self {
			origin: doc.id(),
			path,
			info,
		}
	}
}

/// What a connection attempt starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
	pub origin: Option<DocumentId>,
	pub path: Option<PathBuf>,
}

/// Messages accepted by the host besides session events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
	Eval(PreparedEval),
	/// Start (or reuse) a session for a project directory.
	Connect(PathBuf),
	/// Tear down the session for a project root.
	Disconnect(PathBuf),
	/// A popup button was chosen.
	Popup(PopupAction),
	Configure(SettingKey, Option<PathBuf>),
}

/// Cloneable sender for [`HostCommand`]s.
#[derive(Debug, Clone)]
pub struct HostHandle {
	tx: mpsc::UnboundedSender<HostCommand>,
}

impl HostHandle {
	/// Returns `false` if the host is gone.
	pub fn send(&self, command: HostCommand) -> bool {
		self.tx.send(command).is_ok()
	}
}

/// Editor-side collaborators.
pub struct HostParts {
	pub editor: Box<dyn Editor>,
	pub notifier: Box<dyn Notifier>,
	pub console: Box<dyn Console>,
}

/// Owns every session and handles every event.
pub struct SessionHost {
	registry: SessionRegistry,
	server: ControlServer,
	launcher: Box<dyn Launcher>,
	probe: InterpreterProbe,
	locator: ProjectLocator,
	settings: Settings,
	store: Option<SettingsStore>,
	editor: Box<dyn Editor>,
	notifier: Box<dyn Notifier>,
	console: Box<dyn Console>,
	event_tx: EventSender,
	events: EventReceiver,
	command_tx: mpsc::UnboundedSender<HostCommand>,
	commands: mpsc::UnboundedReceiver<HostCommand>,
}

impl SessionHost {
	/// Binds the control channel and spawns real interpreter processes.
	pub async fn start(settings: Settings, parts: HostParts) -> Result<Self> {
		Self::start_with(settings, parts, |events| Box::new(ProcessSupervisor::new(events))).await
	}

	/// Like [`start`](Self::start) with a caller-supplied launcher.
	pub async fn start_with<F>(settings: Settings, parts: HostParts, make_launcher: F) -> Result<Self>
	where
		F: FnOnce(EventSender) -> Box<dyn Launcher>,
	{
		let (event_tx, events) = event_channel();
		let server = ControlServer::bind(event_tx.clone()).await?;
		let (command_tx, commands) = mpsc::unbounded_channel();

		Ok(Self {
			registry: SessionRegistry::new(),
			server,
			launcher: make_launcher(event_tx.clone()),
			probe: InterpreterProbe::new(settings.interpreter.clone()),
			locator: ProjectLocator::default(),
			settings,
			store: None,
			editor: parts.editor,
			notifier: parts.notifier,
			console: parts.console,
			event_tx,
			events,
			command_tx,
			commands,
		})
	}

	/// Persists setting changes to `store`.
	pub fn with_store(mut self, store: SettingsStore) -> Self {
		self.store = Some(store);
		self
	}

	/// Replaces the interpreter probe. The configured override is kept.
	pub fn with_probe(mut self, mut probe: InterpreterProbe) -> Self {
		probe.set_override(self.settings.interpreter.clone());
		self.probe = probe;
		self
	}

	pub fn handle(&self) -> HostHandle {
		HostHandle {
			tx: self.command_tx.clone(),
		}
	}

	pub fn event_sender(&self) -> EventSender {
		self.event_tx.clone()
	}

	pub fn registry(&self) -> &SessionRegistry {
		&self.registry
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn control_port(&self) -> u16 {
		self.server.port()
	}

	/// Finds or starts the session for `target`.
	///
	/// Always returns a client. When a precondition fails the user is told
	/// why and the returned client is already closed, so sends on it fail
	/// immediately.
	pub fn try_connect(&mut self, target: ConnectTarget) -> ControlClient {
		let root = target.path.as_deref().and_then(|p| self.locator.locate(p));
		if let Some(existing) = root.as_deref().and_then(|r| self.registry.find_by_root(r)) {
			trace!(target = "fsi", session = %existing.id, "reusing session");
			return existing.client.clone();
		}

		let id = self.registry.next_id();
		let client = self.server.open(id);
		let command = self.probe.command();
		let interpreter = self.probe.resolve();
		let bridge = locate_bridge_script(self.settings.bridge_script.as_deref());

		let (interpreter, root) = match (interpreter, bridge.present, root) {
			(None, _, _) => {
				info!(target = "fsi", command, "interpreter not found");
				self.abort_connect(id, notices::interpreter_missing(command));
				return client;
			}
			(Some(_), false, _) => {
				info!(target = "fsi", path = %bridge.path.display(), "bridge script not found");
				self.abort_connect(id, notices::bridge_missing(&bridge.path));
				return client;
			}
			(Some(_), true, None) => {
				info!(target = "fsi", path = ?target.path, "no project root");
				self.abort_connect(id, notices::unsaved_document(target.origin));
				return client;
			}
			(Some(interpreter), true, Some(root)) => (interpreter, root),
		};

		let session = Session::new(client.clone(), root, target.origin, interpreter, bridge.path);
		if let Some(mut displaced) = self.registry.insert(session) {
			self.server.remove(displaced.id);
			displaced.kill();
		}
		if let Err(err) = self.launch(id) {
			warn!(target = "fsi", session = %id, error = %err, "launch failed");
		}
		client
	}

	fn abort_connect(&mut self, id: SessionId, popup: crate::interfaces::Popup) {
		self.server.remove(id);
		self.notifier.end_working();
		self.notifier.popup(popup);
	}

	/// Spawns the interpreter for a registered session.
	fn launch(&mut self, id: SessionId) -> Result<()> {
		let port = self.server.port();
		let Some(session) = self.registry.get_mut(id) else {
			return Err(Error::LaunchRefused("session is not registered"));
		};
		if session.interpreter.executable.as_os_str().is_empty() {
			return Err(Error::LaunchRefused("no interpreter executable"));
		}
		if session.root.as_os_str().is_empty() {
			return Err(Error::LaunchRefused("no project root"));
		}

		self.notifier.begin_working(WORKING_CONNECTING);
		let spec = LaunchSpec::bridge(
			session.interpreter.command,
			&session.bridge_script,
			port,
			id,
			&session.interpreter.executable,
			&session.root,
		);
		debug!(target = "fsi", session = %id, args = ?spec.args, "launching interpreter");

		match self.launcher.launch(id, spec) {
			Ok(process) => {
				session.attach_process(process);
				Ok(())
			}
			Err(err) => {
				self.fail_session(id, err.to_string());
				Err(err)
			}
		}
	}

	/// Reports a failed start, then releases the session.
	fn fail_session(&mut self, id: SessionId, report: String) {
		self.notifier.end_working();
		self.notifier.popup(notices::connect_failed(&report));
		self.server.remove(id);
		if let Some(mut session) = self.registry.remove(id) {
			session.kill();
		}
	}

	/// Evaluates part of `doc`.
	pub fn eval(&mut self, doc: &dyn Document, scope: EvalScope) -> Result<()> {
		self.submit(PreparedEval::from_document(doc, scope))
	}

	/// Sends a prepared evaluation, connecting first if needed.
	pub fn submit(&mut self, request: PreparedEval) -> Result<()> {
		self.notifier.begin_working("");
		let client = self.try_connect(ConnectTarget {
			origin: Some(request.origin),
			path: request.path.clone(),
		});
		let sent = client.send(EvalRequest::eval(request.origin, request.info));
		if let Err(err) = &sent {
			debug!(target = "fsi", error = %err, "evaluation not sent");
			// Aborted and failed starts have already cleared the label.
			if self.registry.contains(client.session()) {
				self.notifier.end_working();
			}
		}
		sent
	}

	/// Removes the session for `root` and kills its process.
	pub fn disconnect(&mut self, root: &Path) -> bool {
		let Some(id) = self.registry.find_by_root(root).map(|s| s.id) else {
			return false;
		};
		info!(target = "fsi", session = %id, root = %root.display(), "disconnecting");
		self.server.remove(id);
		if let Some(mut session) = self.registry.remove(id) {
			session.kill();
		}
		true
	}

	/// Updates a setting, persisting it when a store is attached.
	pub fn configure(&mut self, key: SettingKey, value: Option<PathBuf>) {
		self.settings.set(key, value);
		if key == SettingKey::Interpreter {
			self.probe.set_override(self.settings.interpreter.clone());
		}
		if let Some(store) = &self.store {
			if let Err(err) = store.save(&self.settings) {
				warn!(target = "fsi", path = %store.path().display(), error = %err, "failed to save settings");
			}
		}
	}

	pub fn handle_command(&mut self, command: HostCommand) {
		match command {
			HostCommand::Eval(request) => {
				if let Err(err) = self.submit(request) {
					info!(target = "fsi", error = %err, "queued evaluation dropped");
				}
			}
			HostCommand::Connect(dir) => {
				self.try_connect(ConnectTarget {
					origin: None,
					path: Some(dir),
				});
			}
			HostCommand::Disconnect(root) => {
				self.disconnect(&root);
			}
			HostCommand::Popup(action) => self.on_popup(action),
			HostCommand::Configure(key, value) => self.configure(key, value),
		}
	}

	fn on_popup(&mut self, action: PopupAction) {
		match action {
			PopupAction::OpenUrl(url) => self.notifier.open_url(&url),
			PopupAction::SaveAndRetry(doc) => {
				let path = self.editor.save(doc);
				self.try_connect(ConnectTarget {
					origin: Some(doc),
					path,
				});
			}
			PopupAction::Dismiss => {}
		}
	}

	pub fn handle_event(&mut self, event: SessionEvent) {
		let SessionEvent { session: id, kind } = event;
		let Some(session) = self.registry.get_mut(id) else {
			trace!(target = "fsi", session = %id, ?kind, "event for closed session");
			return;
		};

		match kind {
			SessionEventKind::Stdout(chunk) => {
				trace!(target = "fsi", session = %id, %chunk, "stdout");
				if session.handshake.on_stdout(&chunk) {
					info!(target = "fsi", session = %id, root = %session.root.display(), "interpreter connected");
					self.notifier.end_working();
				}
			}
			SessionEventKind::Stderr(chunk) => {
				trace!(target = "fsi", session = %id, %chunk, "stderr");
				session.handshake.on_stderr(&chunk);
			}
			SessionEventKind::Exit(code) => self.on_exit(id, code),
			SessionEventKind::Attached => {
				debug!(target = "fsi", session = %id, "bridge attached");
				session.attached = true;
			}
			SessionEventKind::Detached => {
				debug!(target = "fsi", session = %id, "bridge detached");
				session.attached = false;
			}
			SessionEventKind::Inbound(inbound) => self.dispatch(inbound),
		}
	}

	fn on_exit(&mut self, id: SessionId, code: Option<i32>) {
		let Some(session) = self.registry.get_mut(id) else {
			return;
		};
		match session.handshake.on_exit() {
			ExitOutcome::AfterConnect => {
				info!(target = "fsi", session = %id, ?code, "interpreter exited");
				self.server.remove(id);
				self.registry.remove(id);
			}
			ExitOutcome::Failed { report } => {
				warn!(target = "fsi", session = %id, ?code, "interpreter exited before connecting");
				self.fail_session(id, report);
			}
		}
	}

	/// Handles the next event or command. `false` once both inputs closed.
	pub async fn step(&mut self) -> bool {
		tokio::select! {
			Some(event) = self.events.recv() => {
				self.handle_event(event);
				true
			}
			Some(command) = self.commands.recv() => {
				self.handle_command(command);
				true
			}
			else => false,
		}
	}

	/// Tears down every session.
	pub fn shutdown(&mut self) {
		for id in self.registry.ids() {
			self.server.remove(id);
			if let Some(mut session) = self.registry.remove(id) {
				session.kill();
			}
		}
		self.server.shutdown();
	}
}

impl Drop for SessionHost {
	fn drop(&mut self) {
		self.shutdown();
	}
}
