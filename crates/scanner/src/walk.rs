use std::fs::DirEntry;
use std::path::{Path, PathBuf};

use mediacat_core::identity;
use mediacat_core::types::{MediaKind, Picture, Video, VideoAttributes};
use tracing::{debug, error, warn};

use crate::media;

/// Entity discovered during a folder walk, not yet reconciled with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCandidate {
    Video(Video),
    Picture(Picture),
}

impl ScanCandidate {
    pub fn id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Picture(p) => &p.id,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video(_) => MediaKind::Video,
            Self::Picture(_) => MediaKind::Picture,
        }
    }
}

/// Walk `root` recursively, tagging every discovered file with `origin_id`.
///
/// Sub-directories do not get identities of their own: media found anywhere
/// below `root` belongs to the origin folder. The walk is lazy (one directory
/// listing is held per nesting level) and never writes to the filesystem, so
/// calling this again restarts it from scratch.
pub fn scan_folder(root: &Path, origin_id: &str) -> FolderScan {
    let mut scan = FolderScan {
        root: root.to_path_buf(),
        origin_id: origin_id.to_string(),
        stack: Vec::new(),
    };
    if let Some(frame) = read_sorted(root) {
        scan.stack.push(frame);
    }
    scan
}

/// Lazy depth-first walk produced by [`scan_folder`].
#[derive(Debug)]
pub struct FolderScan {
    root: PathBuf,
    origin_id: String,
    stack: Vec<std::vec::IntoIter<DirEntry>>,
}

impl FolderScan {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn origin_id(&self) -> &str {
        &self.origin_id
    }

    /// A fresh walk over the same root.
    pub fn restart(&self) -> FolderScan {
        scan_folder(&self.root, &self.origin_id)
    }

    fn candidate(&self, entry: &DirEntry) -> Option<ScanCandidate> {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        match media::classify(&name)? {
            MediaKind::Video => self.video_candidate(entry, &path, &name).map(ScanCandidate::Video),
            MediaKind::Picture => self.picture_candidate(&path, &name).map(ScanCandidate::Picture),
        }
    }

    fn video_candidate(&self, entry: &DirEntry, path: &Path, name: &str) -> Option<Video> {
        let size_bytes = match entry.metadata() {
            Ok(m) => m.len() as i64,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read video metadata");
                0
            }
        };
        let file_path = path.to_string_lossy().into_owned();
        // Duration is unknown at scan time; ids are always derived with zero.
        let id = match identity::video_id(size_bytes, 0, &file_path) {
            Ok(id) => id,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping video without id");
                return None;
            }
        };

        Some(Video {
            id,
            title: name.to_string(),
            file_path,
            duration_ms: 0,
            size_bytes,
            folder_id: self.origin_id.clone(),
            attributes: VideoAttributes {
                exists: true,
                watched: false,
            },
        })
    }

    fn picture_candidate(&self, path: &Path, name: &str) -> Option<Picture> {
        let file_path = path.to_string_lossy().into_owned();
        let id = match identity::picture_id(&file_path) {
            Ok(id) => id,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping picture without id");
                return None;
            }
        };
        let size_bytes = match std::fs::symlink_metadata(path) {
            Ok(m) => Some(m.len() as i64),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat picture");
                None
            }
        };

        Some(Picture {
            id,
            file_path,
            title: name.to_string(),
            size_bytes,
            folder_id: self.origin_id.clone(),
        })
    }
}

impl Iterator for FolderScan {
    type Item = ScanCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.stack.last_mut()?.next() {
                Some(entry) => entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "cannot read file type");
                    continue;
                }
            };

            if file_type.is_dir() {
                if let Some(frame) = read_sorted(&entry.path()) {
                    self.stack.push(frame);
                }
                continue;
            }

            match self.candidate(&entry) {
                Some(candidate) => return Some(candidate),
                None => debug!(path = %entry.path().display(), "skipping non-media entry"),
            }
        }
    }
}

/// List a directory sorted by file name. An unreadable directory is logged and
/// contributes nothing, so siblings are still walked.
fn read_sorted(dir: &Path) -> Option<std::vec::IntoIter<DirEntry>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot read directory");
            return None;
        }
    };

    let mut entries: Vec<DirEntry> = read_dir
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read directory entry");
                None
            }
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());
    Some(entries.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, bytes: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn nested_media_is_attributed_to_origin() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.mp4"), 10);
        write(&dir.path().join("season/deeper/b.mp4"), 20);
        write(&dir.path().join("album/c.JPG"), 5);
        write(&dir.path().join("notes.txt"), 1);

        let found: Vec<ScanCandidate> = scan_folder(dir.path(), "f-42").collect();
        assert_eq!(found.len(), 3);

        for c in &found {
            match c {
                ScanCandidate::Video(v) => assert_eq!(v.folder_id, "f-42"),
                ScanCandidate::Picture(p) => assert_eq!(p.folder_id, "f-42"),
            }
        }

        let deep = found
            .iter()
            .find_map(|c| match c {
                ScanCandidate::Video(v) if v.title == "b.mp4" => Some(v),
                _ => None,
            })
            .unwrap();
        assert_eq!(deep.size_bytes, 20);
        assert!(deep.attributes.exists);
        assert!(!deep.attributes.watched);
        assert_eq!(
            deep.id,
            identity::video_id(20, 0, &deep.file_path).unwrap()
        );
    }

    #[test]
    fn picture_carries_size_and_path_id() {
        let dir = tempfile::tempdir().unwrap();
        let pic = dir.path().join("b.png");
        write(&pic, 7);

        let found: Vec<ScanCandidate> = scan_folder(dir.path(), "f-1").collect();
        let [ScanCandidate::Picture(p)] = found.as_slice() else {
            panic!("expected one picture, got {found:?}");
        };
        assert_eq!(p.size_bytes, Some(7));
        assert_eq!(p.title, "b.png");
        assert_eq!(p.id, identity::picture_id(&p.file_path).unwrap());
    }

    #[test]
    fn walk_is_sorted_and_restartable() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b.mp4"), 1);
        write(&dir.path().join("a.mp4"), 1);
        write(&dir.path().join("c/d.mp4"), 1);

        let scan = scan_folder(dir.path(), "f-1");
        let again = scan.restart();
        let first: Vec<String> = scan.map(|c| c.id().to_string()).collect();
        let second: Vec<String> = again.map(|c| c.id().to_string()).collect();
        assert_eq!(first, second);

        let titles: Vec<String> = scan_folder(dir.path(), "f-1")
            .filter_map(|c| match c {
                ScanCandidate::Video(v) => Some(v.title),
                ScanCandidate::Picture(_) => None,
            })
            .collect();
        assert_eq!(titles, vec!["a.mp4", "b.mp4", "d.mp4"]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scan_folder(&dir.path().join("does-not-exist"), "f-1");
        assert_eq!(scan.count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_does_not_block_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("locked/hidden.mp4"), 1);
        write(&dir.path().join("open/visible.mp4"), 1);
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let titles: Vec<String> = scan_folder(dir.path(), "f-1")
            .filter_map(|c| match c {
                ScanCandidate::Video(v) => Some(v.title),
                ScanCandidate::Picture(_) => None,
            })
            .collect();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(titles.contains(&"visible.mp4".to_string()));
    }
}
