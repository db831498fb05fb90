//! End-to-end run of the control channel with a stand-in bridge.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fsi::protocol::{DocumentId, EvalRequest, EVAL_COMMAND, Hello, WatchId};
use fsi::runtime::{LaunchSpec, Launcher, ProcessHandle, SessionEvent, SessionEventKind};
use fsi::{
	Anchor, Console, EvalScope, HostParts, InlineResult, LocatedLog, Notifier, Popup, SessionHost, Settings,
	TextDocument,
};
use fsi::{Editor, Result};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

type Shown = Arc<Mutex<Vec<(DocumentId, Anchor, InlineResult)>>>;

#[derive(Clone, Default)]
struct Surface {
	shown: Shown,
	popups: Arc<Mutex<Vec<Popup>>>,
}

impl Editor for Surface {
	fn show_result(&mut self, doc: DocumentId, anchor: Anchor, result: InlineResult) {
		self.shown.lock().unwrap().push((doc, anchor, result));
	}

	fn update_watch(&mut self, _doc: DocumentId, _watch: &WatchId, _result: &str) {}

	fn save(&mut self, _doc: DocumentId) -> Option<PathBuf> {
		None
	}
}

impl Notifier for Surface {
	fn begin_working(&mut self, _label: &str) {}

	fn end_working(&mut self) {}

	fn popup(&mut self, popup: Popup) {
		self.popups.lock().unwrap().push(popup);
	}
}

impl Console for Surface {
	fn log_at_location(&mut self, _entry: LocatedLog) {}
}

/// Holds kill senders open so the "process" stays alive.
#[derive(Default)]
struct Idle {
	kills: Vec<oneshot::Receiver<()>>,
}

impl Launcher for Idle {
	fn launch(&mut self, session: fsi::protocol::SessionId, _spec: LaunchSpec) -> Result<ProcessHandle> {
		let (tx, rx) = oneshot::channel();
		self.kills.push(rx);
		Ok(ProcessHandle::new(session, None, tx))
	}
}

#[tokio::test]
async fn request_reaches_bridge_and_response_renders() {
	let dir = TempDir::new().unwrap();
	let bridge = dir.path().join("ltfsclient.fsx");
	std::fs::write(&bridge, "").unwrap();
	let script = dir.path().join("script.fsx");
	std::fs::write(&script, "printfn \"hi\"").unwrap();

	let mut settings = Settings::new();
	settings.interpreter = Some(PathBuf::from("/opt/fsharp/fsharpi"));
	settings.bridge_script = Some(bridge);

	let surface = Surface::default();
	let parts = HostParts {
		editor: Box::new(surface.clone()),
		notifier: Box::new(surface.clone()),
		console: Box::new(surface.clone()),
	};
	let mut host = SessionHost::start_with(settings, parts, |_| Box::new(Idle::default()))
		.await
		.unwrap();

	let doc = TextDocument::open(DocumentId(7), &script).unwrap();
	host.eval(&doc, EvalScope::Document).unwrap();
	let session = host.registry().ids()[0];

	// The interpreter would print this once the bridge script has loaded.
	host.event_sender()
		.send(SessionEvent::new(session, SessionEventKind::Stdout("Connected\n".into())))
		.unwrap();

	let stream = TcpStream::connect(("127.0.0.1", host.control_port())).await.unwrap();
	let (read, mut write) = stream.into_split();
	let hello = serde_json::to_string(&Hello { session }).unwrap();
	write.write_all(format!("{hello}\n").as_bytes()).await.unwrap();

	let mut lines = BufReader::new(read).lines();
	let bridge_side = tokio::spawn(async move {
		let line = lines.next_line().await.unwrap().unwrap();
		let request: EvalRequest = serde_json::from_str(&line).unwrap();
		let reply = r#"{"origin":7,"tag":"result","result":"hi","meta":{"start":0,"end":0}}"#;
		write.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
		(request, write)
	});

	let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
	while surface.shown.lock().unwrap().is_empty() {
		assert!(tokio::time::Instant::now() < deadline, "no response rendered");
		let _ = tokio::time::timeout(Duration::from_millis(100), host.step()).await;
	}

	let (request, _write) = bridge_side.await.unwrap();
	assert_eq!(request.command, EVAL_COMMAND);
	assert_eq!(request.origin, DocumentId(7));
	assert_eq!(request.info.code, "printfn \"hi\"");
	assert_eq!(request.info.name.as_deref(), Some("script.fsx"));

	assert_eq!(
		*surface.shown.lock().unwrap(),
		vec![(DocumentId(7), Anchor::new(0, 0), InlineResult::Text("hi".into()))]
	);
	assert!(surface.popups.lock().unwrap().is_empty());
	assert!(host.registry().get(session).unwrap().is_connected());
	assert!(host.registry().get(session).unwrap().attached);
}
