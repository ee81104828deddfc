//! Merging server-confirmed fields back into local state.

use crate::models::{Post, PostId, PostPatch};

/// Merges `patch` into the post with `id` and, when it is the active post,
/// into the active copy as well.
///
/// Returns `false` (and changes nothing) when no listed post has that id.
pub fn reconcile(
    posts: &mut [Post],
    active: Option<&mut Post>,
    id: PostId,
    patch: &PostPatch,
) -> bool {
    let Some(listed) = posts.iter_mut().find(|p| p.id == id) else {
        tracing::debug!(post_id = id, "reconcile skipped, post no longer listed");
        return false;
    };
    patch.apply_to(listed);

    if let Some(active) = active.filter(|p| p.id == id) {
        patch.apply_to(active);
    }
    true
}
