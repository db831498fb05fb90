//! Interpreter process supervision
//!
//! Spawns `fsi`/`fsharpi` running the bridge script and turns its stdout,
//! stderr and exit into [`SessionEvent`]s. The returned [`ProcessHandle`] is
//! the only way to stop the process; dropping it kills the process too.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use fsi_protocol::SessionId;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::bridge::escape_for_platform;
use crate::error::{Error, Result};
use crate::events::{EventSender, SessionEvent, SessionEventKind};

const READ_CHUNK: usize = 4096;

/// Everything needed to spawn one interpreter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
	pub program: PathBuf,
	pub args: Vec<String>,
	pub cwd: PathBuf,
}

impl LaunchSpec {
	/// Builds the bridge invocation:
	/// `<command> --exec <bridge> <port> <session> <interpreter>`.
	///
	/// Both paths are quoted on backslash-separated platforms.
	pub fn bridge(
		command: &str,
		bridge_script: &Path,
		port: u16,
		session: SessionId,
		interpreter: &Path,
		project_root: &Path,
	) -> Self {
		Self {
			program: PathBuf::from(command),
			args: vec![
				"--exec".to_string(),
				escape_for_platform(bridge_script),
				port.to_string(),
				session.to_string(),
				escape_for_platform(interpreter),
			],
			cwd: project_root.to_path_buf(),
		}
	}
}

/// Owner of a running interpreter process.
#[derive(Debug)]
pub struct ProcessHandle {
	session: SessionId,
	pid: Option<u32>,
	kill_tx: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
	/// Wraps a kill signal. The receiving side is expected to terminate the
	/// process when it fires or when the sender is dropped.
	pub fn new(session: SessionId, pid: Option<u32>, kill_tx: oneshot::Sender<()>) -> Self {
		Self {
			session,
			pid,
			kill_tx: Some(kill_tx),
		}
	}

	pub fn session(&self) -> SessionId {
		self.session
	}

	pub fn pid(&self) -> Option<u32> {
		self.pid
	}

	/// Requests termination. Returns `false` if already requested or the
	/// process is gone.
	pub fn kill(&mut self) -> bool {
		match self.kill_tx.take() {
			Some(tx) => tx.send(()).is_ok(),
			None => false,
		}
	}
}

/// Starts interpreter processes.
pub trait Launcher: Send {
	fn launch(&mut self, session: SessionId, spec: LaunchSpec) -> Result<ProcessHandle>;
}

/// [`Launcher`] backed by real child processes.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
	events: EventSender,
}

impl ProcessSupervisor {
	pub fn new(events: EventSender) -> Self {
		Self { events }
	}
}

impl Launcher for ProcessSupervisor {
	/// Spawns the process and returns without waiting on it.
	///
	/// Must be called from within a tokio runtime.
	fn launch(&mut self, session: SessionId, spec: LaunchSpec) -> Result<ProcessHandle> {
		let mut child = Command::new(&spec.program)
			.args(&spec.args)
			.current_dir(&spec.cwd)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| {
				Error::LaunchFailed(format!("failed to spawn {}: {e}", spec.program.display()))
			})?;

		let pid = child.id();
		info!(
			target = "fsi",
			%session,
			pid,
			program = %spec.program.display(),
			cwd = %spec.cwd.display(),
			"interpreter spawned"
		);

		let (kill_tx, kill_rx) = oneshot::channel();
		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		tokio::spawn(supervise(session, child, stdout, stderr, kill_rx, self.events.clone()));

		Ok(ProcessHandle::new(session, pid, kill_tx))
	}
}

async fn supervise<O, E>(
	session: SessionId,
	mut child: Child,
	mut stdout: Option<O>,
	mut stderr: Option<E>,
	mut kill_rx: oneshot::Receiver<()>,
	events: EventSender,
) where
	O: AsyncRead + Unpin,
	E: AsyncRead + Unpin,
{
	let emit = |kind| {
		if events.send(SessionEvent::new(session, kind)).is_err() {
			debug!(target = "fsi", %session, "event receiver gone");
		}
	};

	let mut out_buf = vec![0u8; READ_CHUNK];
	let mut err_buf = vec![0u8; READ_CHUNK];
	let mut out_text = Utf8Chunks::default();
	let mut err_text = Utf8Chunks::default();
	let mut out_open = stdout.is_some();
	let mut err_open = stderr.is_some();
	let mut kill_pending = true;

	while out_open || err_open {
		tokio::select! {
			read = read_some(&mut stdout, &mut out_buf), if out_open => match read {
				Ok(0) | Err(_) => {
					out_open = false;
					if let Some(rest) = out_text.finish() {
						emit(SessionEventKind::Stdout(rest));
					}
				}
				Ok(n) => {
					if let Some(text) = out_text.push(&out_buf[..n]) {
						emit(SessionEventKind::Stdout(text));
					}
				}
			},
			read = read_some(&mut stderr, &mut err_buf), if err_open => match read {
				Ok(0) | Err(_) => {
					err_open = false;
					if let Some(rest) = err_text.finish() {
						emit(SessionEventKind::Stderr(rest));
					}
				}
				Ok(n) => {
					if let Some(text) = err_text.push(&err_buf[..n]) {
						emit(SessionEventKind::Stderr(text));
					}
				}
			},
			_ = &mut kill_rx, if kill_pending => {
				kill_pending = false;
				debug!(target = "fsi", %session, "killing interpreter");
				if let Err(err) = child.start_kill() {
					warn!(target = "fsi", %session, error = %err, "failed to kill interpreter");
				}
			}
		}
	}

	let status = tokio::select! {
		status = child.wait() => status,
		_ = &mut kill_rx, if kill_pending => {
			let _ = child.start_kill();
			child.wait().await
		}
	};
	let code = match status {
		Ok(status) => status.code(),
		Err(err) => {
			warn!(target = "fsi", %session, error = %err, "failed to reap interpreter");
			None
		}
	};
	info!(target = "fsi", %session, ?code, "interpreter exited");
	emit(SessionEventKind::Exit(code));
}

async fn read_some<R: AsyncRead + Unpin>(
	reader: &mut Option<R>,
	buf: &mut [u8],
) -> std::io::Result<usize> {
	match reader {
		Some(reader) => reader.read(buf).await,
		None => Ok(0),
	}
}

/// Decodes a byte stream into text without splitting multi-byte characters
/// across chunks.
#[derive(Debug, Default)]
struct Utf8Chunks {
	pending: Vec<u8>,
}

impl Utf8Chunks {
	fn push(&mut self, bytes: &[u8]) -> Option<String> {
		self.pending.extend_from_slice(bytes);
		let valid = match std::str::from_utf8(&self.pending) {
			Ok(_) => self.pending.len(),
			// Incomplete trailing sequence: hold it for the next chunk.
			Err(err) if err.error_len().is_none() => err.valid_up_to(),
			Err(_) => self.pending.len(),
		};
		if valid == 0 {
			return None;
		}
		let rest = self.pending.split_off(valid);
		let text = String::from_utf8_lossy(&self.pending).into_owned();
		self.pending = rest;
		Some(text)
	}

	fn finish(&mut self) -> Option<String> {
		if self.pending.is_empty() {
			return None;
		}
		let text = String::from_utf8_lossy(&self.pending).into_owned();
		self.pending.clear();
		Some(text)
	}
}
