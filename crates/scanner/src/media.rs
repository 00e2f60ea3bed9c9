use std::path::Path;

use mediacat_core::types::MediaKind;

/// Matched case-sensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Matched case-insensitively.
pub const PICTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

pub fn is_video_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext))
}

pub fn is_picture_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|ext| PICTURE_EXTENSIONS.contains(&ext.as_str()))
}

/// Classify a file name, `None` for anything the catalog ignores.
pub fn classify(name: &str) -> Option<MediaKind> {
    if is_video_file(name) {
        Some(MediaKind::Video)
    } else if is_picture_file(name) {
        Some(MediaKind::Picture)
    } else {
        None
    }
}
