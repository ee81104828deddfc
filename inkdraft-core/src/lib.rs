//! inkdraft core library
//!
//! Shared models, the debounced auto-save pipeline and the HTTP client used
//! by the `ink` CLI and the `inkdraft-server` backend.

pub mod autosave;
pub mod buffer;
pub mod client;
pub mod debounce;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod snapshot;
pub mod store;

pub use autosave::{AutoSaver, Followup, SaveState, DEFAULT_QUIET_WINDOW};
pub use buffer::ChangeBuffer;
pub use client::ApiClient;
pub use debounce::Debouncer;
pub use error::ApiError;
pub use models::{
    AiAction, AiRequest, AiResponse, Credentials, Me, NewPost, Post, PostId, PostPatch,
    PostStatus, PostUpdate, TokenResponse,
};
pub use reconcile::reconcile;
pub use remote::PostStore;
pub use snapshot::{plain_text, Snapshot};
pub use store::{EditorStore, SharedStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
