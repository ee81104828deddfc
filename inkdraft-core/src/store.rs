//! Editor state shared between the UI side and the auto-save pipeline.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::buffer::ChangeBuffer;
use crate::models::{Post, PostId, PostPatch, PostStatus};
use crate::reconcile::reconcile;
use crate::snapshot::Snapshot;

/// Handle passed to everything that reads or mutates editor state.
pub type SharedStore = Arc<Mutex<EditorStore>>;

/// Post collection, active post and save status.
///
/// The active post is a copy of a listed record; persisted fields only
/// change through [`update_post_in_list`](Self::update_post_in_list), which
/// keeps both copies in step.
#[derive(Debug, Default)]
pub struct EditorStore {
    posts: Vec<Post>,
    current: Option<Post>,
    buffer: ChangeBuffer,
    is_saving: bool,
    last_saved_at: Option<DateTime<Utc>>,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    /// Newest posts go first, as the server lists them.
    pub fn add_post(&mut self, post: Post) {
        self.posts.insert(0, post);
    }

    pub fn remove_post(&mut self, id: PostId) -> Option<Post> {
        let index = self.posts.iter().position(|p| p.id == id)?;
        if self.current.as_ref().is_some_and(|p| p.id == id) {
            self.set_current_post(None);
        }
        Some(self.posts.remove(index))
    }

    pub fn find(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn current_post(&self) -> Option<&Post> {
        self.current.as_ref()
    }

    /// Opens `post` (or closes the editor) and resets the change buffer to
    /// the post's persisted baseline.
    pub fn set_current_post(&mut self, post: Option<Post>) {
        match &post {
            Some(p) => self
                .buffer
                .reset(p.id, Snapshot::from_persisted(p.content.as_deref())),
            None => self.buffer.clear(),
        }
        self.current = post;
    }

    pub fn buffer(&self) -> &ChangeBuffer {
        &self.buffer
    }

    /// Records an edit. Returns `false` when no post is open.
    pub fn set_editor_json(&mut self, snapshot: Snapshot) -> bool {
        self.buffer.replace(snapshot)
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn set_saving(&mut self, saving: bool) {
        self.is_saving = saving;
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.last_saved_at = Some(at);
    }

    pub fn update_post_in_list(&mut self, id: PostId, patch: &PostPatch) -> bool {
        reconcile(&mut self.posts, self.current.as_mut(), id, patch)
    }

    /// Posts with `status` (any when `None`) whose title contains `query`,
    /// ignoring case.
    pub fn filter(&self, status: Option<PostStatus>, query: &str) -> Vec<&Post> {
        let query = query.to_lowercase();
        self.posts
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .filter(|p| p.title.to_lowercase().contains(&query))
            .collect()
    }
}
