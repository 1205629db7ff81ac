//! Audio file sniffing using magic numbers with an extension-based fallback.

use std::path::Path;

use infer::{Infer, MatcherType};
use mime_guess::MimeGuess;

use crate::error::GraphError;

/// Check that `path` exists and looks like audio, returning its MIME type.
///
/// Sources that fail this check can never be wrapped by a backend, so they
/// are rejected before any audio device is opened.
pub fn probe_audio(path: &Path) -> Result<String, GraphError> {
    if !path.is_file() {
        return Err(GraphError::Construction(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    // 1. Magic-number sniffing
    let sniffed = Infer::new()
        .get_from_path(path)
        .map_err(|e| GraphError::Construction(format!("{}: {}", path.display(), e)))?;
    if let Some(kind) = sniffed {
        return match kind.matcher_type() {
            MatcherType::Audio => Ok(kind.mime_type().to_string()),
            // Containers such as mp4/ogg sniff as video but usually carry audio
            MatcherType::Video if is_audio_extension(path) => Ok(kind.mime_type().to_string()),
            _ => Err(not_audio(path, kind.mime_type())),
        };
    }

    // 2. Extension fallback
    let mime = MimeGuess::from_path(path).first_or_octet_stream().to_string();
    if mime.starts_with("audio/") {
        Ok(mime)
    } else {
        Err(not_audio(path, &mime))
    }
}

fn is_audio_extension(path: &Path) -> bool {
    MimeGuess::from_path(path)
        .iter()
        .any(|m| m.type_() == mime_guess::mime::AUDIO)
}

fn not_audio(path: &Path, mime: &str) -> GraphError {
    GraphError::Construction(format!("{} is not audio ({})", path.display(), mime))
}
