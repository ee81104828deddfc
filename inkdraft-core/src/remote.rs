//! The remote post store as seen by the auto-save pipeline.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{NewPost, Post, PostId, PostStatus, PostUpdate};

/// Server-side post storage.
///
/// The auto-save coordinator only calls [`update`](PostStore::update); the
/// other operations back the post management commands.
#[async_trait]
pub trait PostStore: Send + Sync + 'static {
    async fn list(&self, status: Option<PostStatus>) -> Result<Vec<Post>, ApiError>;

    async fn get(&self, id: PostId) -> Result<Post, ApiError>;

    async fn create(&self, post: &NewPost) -> Result<Post, ApiError>;

    /// Writes the present fields and returns the record as persisted.
    async fn update(&self, id: PostId, fields: &PostUpdate) -> Result<Post, ApiError>;

    async fn publish(&self, id: PostId) -> Result<Post, ApiError>;

    async fn delete(&self, id: PostId) -> Result<(), ApiError>;
}
