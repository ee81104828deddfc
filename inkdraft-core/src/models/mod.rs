mod ai;
mod auth;
mod post;
mod post_status;

pub use ai::{AiAction, AiRequest, AiResponse};
pub use auth::{Credentials, Me, TokenResponse};
pub use post::{NewPost, Post, PostId, PostPatch, PostUpdate};
pub use post_status::PostStatus;
