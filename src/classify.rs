//! Output-type classification by URL file extension.

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".tiff"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".mkv", ".webm", ".m4v"];
const MODEL_EXTENSIONS: &[&str] = &[".gltf", ".glb", ".obj", ".fbx", ".dae", ".3ds", ".blend"];

/// Media kind derived from an output value. Purely a function of the value
/// string; no state is carried between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Image,
    Video,
    Model,
    #[default]
    Text,
}

impl OutputKind {
    /// Default file extension used when a download URL carries none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            OutputKind::Image => "png",
            OutputKind::Video => "mp4",
            OutputKind::Model => "glb",
            OutputKind::Text => "txt",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Image => "image",
            OutputKind::Video => "video",
            OutputKind::Model => "model",
            OutputKind::Text => "text",
        }
    }
}

/// Classify an output value as image, video, 3D model, or plain text.
///
/// Only `http`-prefixed values are inspected; the URL path (query string and
/// fragment stripped) is matched against fixed extension lists in priority
/// order: image, then video, then model. Anything else is text.
pub fn classify(value: &str) -> OutputKind {
    if !value.starts_with("http") {
        return OutputKind::Text;
    }

    let path = url_path(value).to_lowercase();

    for ext in IMAGE_EXTENSIONS {
        if path.ends_with(ext) {
            return OutputKind::Image;
        }
    }
    for ext in VIDEO_EXTENSIONS {
        if path.ends_with(ext) {
            return OutputKind::Video;
        }
    }
    for ext in MODEL_EXTENSIONS {
        if path.ends_with(ext) {
            return OutputKind::Model;
        }
    }
    OutputKind::Text
}

/// The URL with any query string or fragment stripped.
pub(crate) fn url_path(url: &str) -> &str {
    let end = url
        .find(['?', '#'])
        .unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_media_urls_by_extension() {
        assert_eq!(classify("https://x/y.png"), OutputKind::Image);
        assert_eq!(classify("https://x/y.JPEG"), OutputKind::Image);
        assert_eq!(classify("https://x/y.mp4"), OutputKind::Video);
        assert_eq!(classify("https://x/y.glb"), OutputKind::Model);
        assert_eq!(classify("https://x/y.blend"), OutputKind::Model);
    }

    #[test]
    fn unknown_extensions_and_non_urls_are_text() {
        assert_eq!(classify("hello"), OutputKind::Text);
        assert_eq!(classify("https://x/y.unknown"), OutputKind::Text);
        assert_eq!(classify("ftp://x/y.png"), OutputKind::Text);
        assert_eq!(classify(""), OutputKind::Text);
    }

    #[test]
    fn query_strings_and_fragments_are_ignored() {
        assert_eq!(classify("https://x/y.png?token=1"), OutputKind::Image);
        assert_eq!(classify("https://x/y.mp4#t=10"), OutputKind::Video);
        // The extension must end the path, not merely appear in the query.
        assert_eq!(classify("https://x/page?next=.png"), OutputKind::Text);
    }

    #[test]
    fn default_extensions_per_kind() {
        assert_eq!(OutputKind::Image.default_extension(), "png");
        assert_eq!(OutputKind::Video.default_extension(), "mp4");
        assert_eq!(OutputKind::Model.default_extension(), "glb");
        assert_eq!(OutputKind::Text.default_extension(), "txt");
    }
}
