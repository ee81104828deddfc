//! Latest-edit cell for the open post.

use crate::models::PostId;
use crate::snapshot::Snapshot;

/// Holds the most recent snapshot of the active post's document.
///
/// There is never more than one pending value: each edit overwrites the
/// previous one, whatever the save pipeline is doing at the time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBuffer {
    post_id: Option<PostId>,
    snapshot: Option<Snapshot>,
}

impl ChangeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the buffer to `post_id`, starting from its persisted baseline.
    pub fn reset(&mut self, post_id: PostId, baseline: Option<Snapshot>) {
        self.post_id = Some(post_id);
        self.snapshot = baseline;
    }

    /// Unbinds the buffer; nothing is open.
    pub fn clear(&mut self) {
        self.post_id = None;
        self.snapshot = None;
    }

    /// Overwrites the cell. Returns `false` when no post is open.
    pub fn replace(&mut self, snapshot: Snapshot) -> bool {
        if self.post_id.is_none() {
            return false;
        }
        self.snapshot = Some(snapshot);
        true
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.post_id
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// The snapshot worth saving: present and not blank.
    pub fn savable(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref().filter(|s| !s.is_blank())
    }
}
