//! Records exchanged over the control channel.

use std::path::PathBuf;

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{Cursor, DocumentId, LineRange, ResponseMeta, SessionId};

pub use base64::DecodeError as ImageDecodeError;

/// Command name carried by every evaluation request.
pub const EVAL_COMMAND: &str = "editor.eval.fsharp";

/// First line the bridge writes after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
	pub session: SessionId,
}

/// Code plus the positional metadata the bridge needs to report back.
///
/// `pos` is set for a caret-driven evaluation, `meta` for a selection. A
/// whole-document evaluation carries neither; the watch wrappers embedded in
/// `code` supply the anchors instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub code: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pos: Option<Cursor>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub meta: Option<LineRange>,
}

/// Host to bridge: evaluate `info.code` on behalf of `origin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRequest {
	pub command: String,
	pub origin: DocumentId,
	pub info: EvalInfo,
}

impl EvalRequest {
	pub fn eval(origin: DocumentId, info: EvalInfo) -> Self {
		Self {
			command: EVAL_COMMAND.to_string(),
			origin,
			info,
		}
	}
}

/// Typed response from the bridge, discriminated by `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum EvalResponse {
	/// Value of an evaluated expression.
	Result { result: String, meta: ResponseMeta },
	/// Code ran and produced no value.
	Success { meta: ResponseMeta },
	/// Evaluation raised.
	Exception { ex: String, meta: ResponseMeta },
	/// Base64 PNG produced by the evaluated code.
	Image { image: String, meta: ResponseMeta },
	/// Something the evaluated code printed to stdout.
	Print { file: String, msg: String },
	/// New value for a registered watch; `meta.id` names it.
	Watch { result: String, meta: ResponseMeta },
}

impl EvalResponse {
	/// Wire tag, as used in the fully qualified `editor.eval.fsharp.<tag>` name.
	pub fn tag(&self) -> &'static str {
		match self {
			Self::Result { .. } => "result",
			Self::Success { .. } => "success",
			Self::Exception { .. } => "exception",
			Self::Image { .. } => "image",
			Self::Print { .. } => "print",
			Self::Watch { .. } => "watch",
		}
	}

	/// Anchoring metadata, absent for prints.
	pub fn meta(&self) -> Option<&ResponseMeta> {
		match self {
			Self::Result { meta, .. }
			| Self::Success { meta }
			| Self::Exception { meta, .. }
			| Self::Image { meta, .. }
			| Self::Watch { meta, .. } => Some(meta),
			Self::Print { .. } => None,
		}
	}
}

/// Bridge to host: a response addressed to the document that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
	pub origin: DocumentId,
	#[serde(flatten)]
	pub response: EvalResponse,
}

/// Decodes an image payload into PNG bytes.
///
/// Accepts either bare base64 or a `data:image/png;base64,` URL.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, ImageDecodeError> {
	let trimmed = payload.trim();
	let encoded = trimmed
		.strip_prefix("data:image/png;base64,")
		.unwrap_or(trimmed);
	BASE64_STANDARD.decode(encoded)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::types::WatchId;

	#[test]
	fn request_uses_eval_command() {
		let request = EvalRequest::eval(
			DocumentId(2),
			EvalInfo {
				code: "1 + 1".into(),
				meta: Some(LineRange::new(0, 1)),
				..Default::default()
			},
		);
		let value = serde_json::to_value(&request).unwrap();
		assert_eq!(value["command"], "editor.eval.fsharp");
		assert_eq!(value["origin"], 2);
		assert_eq!(value["info"]["meta"], json!({"start": 0, "end": 1}));
		assert!(value["info"].get("pos").is_none());
	}

	#[test]
	fn inbound_success_parses_flat_record() {
		let inbound: Inbound = serde_json::from_value(json!({
			"origin": 1,
			"tag": "success",
			"meta": {"start": 3, "end": 5}
		}))
		.unwrap();
		assert_eq!(inbound.origin, DocumentId(1));
		assert_eq!(inbound.response, EvalResponse::Success { meta: ResponseMeta::new(3, 5) });
	}

	#[test]
	fn inbound_print_has_no_meta() {
		let inbound: Inbound = serde_json::from_str(
			r#"{"origin":4,"tag":"print","file":"/tmp/a.fsx","msg":"hello"}"#,
		)
		.unwrap();
		assert_eq!(inbound.response.tag(), "print");
		assert!(inbound.response.meta().is_none());
	}

	#[test]
	fn inbound_watch_carries_id() {
		let inbound: Inbound = serde_json::from_value(json!({
			"origin": 1,
			"tag": "watch",
			"result": "42",
			"meta": {"start": 0, "end": 0, "id": "w-3"}
		}))
		.unwrap();
		let meta = inbound.response.meta().unwrap();
		assert_eq!(meta.id, Some(WatchId::new("w-3")));
	}

	#[test]
	fn unknown_tag_is_rejected() {
		let result = serde_json::from_value::<Inbound>(json!({
			"origin": 1,
			"tag": "teapot",
			"meta": {"start": 0, "end": 0}
		}));
		assert!(result.is_err());
	}

	#[test]
	fn decode_image_accepts_data_url() {
		let encoded = BASE64_STANDARD.encode([0x89, b'P', b'N', b'G']);
		let bare = decode_image(&encoded).unwrap();
		let url = decode_image(&format!("data:image/png;base64,{encoded}")).unwrap();
		assert_eq!(bare, vec![0x89, b'P', b'N', b'G']);
		assert_eq!(bare, url);
	}
}
