use serde::{Deserialize, Serialize};

/// A scanned root folder. `id` is always derived from `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub path: String,
}

/// Filesystem observations and user flags carried by a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAttributes {
    /// Whether the file was present the last time it was looked at.
    pub exists: bool,
    /// User-set flag, never touched by a scan.
    pub watched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub file_path: String,
    pub duration_ms: i64,
    pub size_bytes: i64,
    /// Empty when the video was never attributed to a folder.
    pub folder_id: String,
    pub attributes: VideoAttributes,
}

impl Video {
    pub fn is_orphan(&self) -> bool {
        self.folder_id.is_empty()
    }
}

/// Pictures have no existence flag: a picture whose file is gone is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    pub id: String,
    pub file_path: String,
    pub title: String,
    pub size_bytes: Option<i64>,
    pub folder_id: String,
}

/// Login session. `id` is a random opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_ts: i64,
    pub lifespan_secs: i64,
}

impl Session {
    pub fn expires_at(&self) -> i64 {
        self.created_ts.saturating_add(self.lifespan_secs)
    }

    /// A session is expired once `created_ts + lifespan` lies strictly in the past.
    pub fn is_expired(&self, now_ts: i64) -> bool {
        self.expires_at() < now_ts
    }
}

/// Navigation page advertised to the web client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub url: String,
    pub auth_required: bool,
}

/// Point update applied to a cached video. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPatch {
    pub watched: Option<bool>,
    pub exists: Option<bool>,
}

impl VideoPatch {
    pub fn watched(watched: bool) -> Self {
        Self {
            watched: Some(watched),
            ..Self::default()
        }
    }

    pub fn apply(&self, video: &mut Video) {
        if let Some(watched) = self.watched {
            video.attributes.watched = watched;
        }
        if let Some(exists) = self.exists {
            video.attributes.exists = exists;
        }
    }
}

/// Kind of media file recognised by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Picture,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Picture => "picture",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> Video {
        Video {
            id: "v-1".into(),
            title: "a.mp4".into(),
            file_path: "/media/a.mp4".into(),
            duration_ms: 0,
            size_bytes: 10,
            folder_id: "f-1".into(),
            attributes: VideoAttributes {
                exists: true,
                watched: false,
            },
        }
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut v = sample_video();
        VideoPatch::watched(true).apply(&mut v);
        assert!(v.attributes.watched);
        assert!(v.attributes.exists);

        VideoPatch {
            exists: Some(false),
            ..VideoPatch::default()
        }
        .apply(&mut v);
        assert!(v.attributes.watched);
        assert!(!v.attributes.exists);
    }

    #[test]
    fn session_expiry_is_strict() {
        let s = Session {
            id: "tok".into(),
            user_id: "u".into(),
            created_ts: 1_000,
            lifespan_secs: 60,
        };
        assert!(!s.is_expired(1_000));
        assert!(!s.is_expired(1_060));
        assert!(s.is_expired(1_061));
    }

    #[test]
    fn video_serializes_camel_case() {
        let json = serde_json::to_value(sample_video()).unwrap();
        assert_eq!(json["filePath"], "/media/a.mp4");
        assert_eq!(json["attributes"]["exists"], true);
        assert_eq!(json["folderId"], "f-1");
    }
}
