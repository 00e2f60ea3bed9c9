use std::sync::Arc;

use mediacat_core::types::{Video, VideoPatch};
use tokio::sync::RwLock;

/// Immutable view of the cached video list handed to readers.
pub type Snapshot = Arc<Vec<Video>>;

/// Read-mostly in-memory copy of the live videos.
///
/// Readers clone the current `Arc` and keep it for as long as they like; a
/// later [`replace`](Self::replace) or [`patch`](Self::patch) never mutates a
/// snapshot someone already holds. Patching goes through `Arc::make_mut`, so
/// the list is only copied when a reader still has the old one.
///
/// A rebuild reads the store without holding the lock, so a patch can land
/// between that read and the swap. [`begin_rebuild`](Self::begin_rebuild)
/// starts recording patches and `replace` reapplies them to the new list.
#[derive(Debug, Default)]
pub struct VideoCache {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    videos: Snapshot,
    // Some while a rebuild is in flight.
    pending: Option<Vec<(String, VideoPatch)>>,
}

impl VideoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> Snapshot {
        self.state.read().await.videos.clone()
    }

    /// Start recording patches for the next [`replace`](Self::replace).
    /// Call before reading the rows the new list is built from. Patches
    /// recorded by an earlier unfinished rebuild are dropped.
    pub async fn begin_rebuild(&self) {
        self.state.write().await.pending = Some(Vec::new());
    }

    /// Stop recording without swapping the list.
    pub async fn abandon_rebuild(&self) {
        self.state.write().await.pending = None;
    }

    /// Swap in a fresh list. Patches recorded since
    /// [`begin_rebuild`](Self::begin_rebuild) are applied to it first, in
    /// order. Returns the size of the list it replaced.
    pub async fn replace(&self, mut videos: Vec<Video>) -> usize {
        let mut state = self.state.write().await;
        if let Some(pending) = state.pending.take() {
            for (id, patch) in &pending {
                for video in videos.iter_mut().filter(|v| &v.id == id) {
                    patch.apply(video);
                }
            }
        }
        let previous = state.videos.len();
        state.videos = Arc::new(videos);
        previous
    }

    /// Apply `patch` to every cached entry with `id`. Returns whether any
    /// entry matched; an unknown id is not an error.
    pub async fn patch(&self, id: &str, patch: VideoPatch) -> bool {
        let mut state = self.state.write().await;
        if let Some(pending) = state.pending.as_mut() {
            pending.push((id.to_string(), patch));
        }
        if !state.videos.iter().any(|v| v.id == id) {
            return false;
        }
        for video in Arc::make_mut(&mut state.videos)
            .iter_mut()
            .filter(|v| v.id == id)
        {
            patch.apply(video);
        }
        true
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.videos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.videos.is_empty()
    }
}
