//! Routing of bridge responses to the editor and console.

use std::path::Path;

use fsi_protocol::{EvalResponse, Inbound, ResponseMeta, decode_image};
use tracing::{debug, warn};

use super::SessionHost;
use crate::interfaces::{Anchor, InlineResult, LocatedLog};

/// Rendered for code that ran without producing a value.
pub const SUCCESS_GLYPH: &str = "\u{2713}";

/// Console line label used for printed output.
const PRINT_LINE: &str = "stdout";

impl From<&ResponseMeta> for Anchor {
	fn from(meta: &ResponseMeta) -> Self {
		Anchor::new(meta.start, meta.end)
	}
}

impl SessionHost {
	pub(super) fn dispatch(&mut self, inbound: Inbound) {
		let Inbound { origin, response } = inbound;
		debug!(target = "fsi", %origin, tag = response.tag(), "response");
		self.notifier.end_working();

		match response {
			EvalResponse::Result { result, meta } => {
				self.editor.show_result(origin, (&meta).into(), InlineResult::Text(result));
			}
			EvalResponse::Success { meta } => {
				self.editor
					.show_result(origin, (&meta).into(), InlineResult::Text(SUCCESS_GLYPH.to_string()));
			}
			EvalResponse::Exception { ex, meta } => {
				self.editor.show_result(origin, (&meta).into(), InlineResult::Exception(ex));
			}
			EvalResponse::Image { image, meta } => match decode_image(&image) {
				Ok(png) => self.editor.show_result(origin, (&meta).into(), InlineResult::Image(png)),
				Err(err) => {
					warn!(target = "fsi", %origin, line = meta.end, error = %err, "undecodable image");
				}
			},
			EvalResponse::Print { file, msg } => {
				self.console.log_at_location(LocatedLog {
					file: base_name(&file),
					line: PRINT_LINE.to_string(),
					content: msg,
				});
			}
			EvalResponse::Watch { result, meta } => match &meta.id {
				Some(watch) => self.editor.update_watch(origin, watch, &result),
				None => {
					warn!(target = "fsi", %origin, line = meta.end, "watch response without id");
				}
			},
		}
	}
}

fn base_name(file: &str) -> String {
	Path::new(file)
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| file.to_string())
}
