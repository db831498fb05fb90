//! Editor-side F# interactive sessions.
//!
//! Connects documents to an `fsi`/`fsharpi` process running the bridge
//! script, sends code for evaluation, and routes the typed responses back to
//! the lines that produced them.
//!
//! # Flow
//!
//! ```text
//! Document ──PreparedEval──▶ SessionHost::submit
//!                               │ try_connect: interpreter → bridge → project root
//!                               │ launch (first use only)
//!                               ▼
//!                        ControlClient ──▶ bridge
//!
//! bridge ──Inbound──▶ SessionHost::dispatch ──▶ Editor / Console
//! ```
//!
//! Everything the host needs from the editor is a trait in [`interfaces`].
//! [`TextDocument`] and [`ResultBoard`] are ready-made pieces for front-ends
//! that do not have their own.

pub mod connector;
pub mod document;
pub mod host;
pub mod interfaces;
pub mod notices;
pub mod results;
pub mod session;
pub mod settings;
pub mod watch;

pub use connector::{Connector, FSHARP_CONNECTOR};
pub use document::{TextDocument, Watch};
pub use fsi_protocol as protocol;
pub use fsi_runtime as runtime;
pub use fsi_runtime::{Error, Result};
pub use host::{
	ConnectTarget, EvalScope, HostCommand, HostHandle, HostParts, PreparedEval, SUCCESS_GLYPH,
	SessionHost, WORKING_CONNECTING,
};
pub use interfaces::{
	Anchor, Button, Console, DirectoryPicker, Document, Editor, InlineResult, LocatedLog, Notifier,
	Popup, PopupAction,
};
pub use results::ResultBoard;
pub use session::{Session, SessionRegistry};
pub use settings::{SETTING_COMMANDS, SettingCommand, SettingKey, Settings, SettingsStore};
pub use watch::{WATCH_ENTRY, WatchMeta, wrap};
