//! Post endpoints under `/api/posts`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use inkdraft_core::{NewPost, Post, PostId, PostStatus, PostUpdate};
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::error::{AppError, AppResult};
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status_filter: Option<String>,
}

#[derive(Serialize)]
pub struct Deleted {
    ok: bool,
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> AppResult<Json<Post>> {
    let Json(post) = payload?;
    let owner = current.0.map(|u| u.id);
    let created = state.posts.create(&post, owner).await?;
    tracing::info!(post_id = created.id, owner = ?owner, "Post created");
    Ok(Json(created))
}

/// Unknown `status_filter` values list everything.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Post>>> {
    let status = params
        .status_filter
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<PostStatus>().ok());
    Ok(Json(state.posts.list(status).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<PostId>, PathRejection>,
) -> AppResult<Json<Post>> {
    let Path(id) = id?;
    state
        .posts
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(AppError::post_not_found)
}

/// Auto-save lands here: only the fields present are written.
pub async fn update_post(
    State(state): State<AppState>,
    id: Result<Path<PostId>, PathRejection>,
    payload: Result<Json<PostUpdate>, JsonRejection>,
) -> AppResult<Json<Post>> {
    let Path(id) = id?;
    let Json(fields) = payload?;
    let updated = state
        .posts
        .update(id, &fields)
        .await?
        .ok_or_else(AppError::post_not_found)?;
    tracing::debug!(
        post_id = id,
        title = fields.title.is_some(),
        content = fields.content.is_some(),
        "Post updated"
    );
    Ok(Json(updated))
}

pub async fn publish_post(
    State(state): State<AppState>,
    id: Result<Path<PostId>, PathRejection>,
) -> AppResult<Json<Post>> {
    let Path(id) = id?;
    let published = state
        .posts
        .set_status(id, PostStatus::Published)
        .await?
        .ok_or_else(AppError::post_not_found)?;
    tracing::info!(post_id = id, "Post published");
    Ok(Json(published))
}

pub async fn delete_post(
    State(state): State<AppState>,
    id: Result<Path<PostId>, PathRejection>,
) -> AppResult<Json<Deleted>> {
    let Path(id) = id?;
    if !state.posts.delete(id).await? {
        return Err(AppError::post_not_found());
    }
    tracing::info!(post_id = id, "Post deleted");
    Ok(Json(Deleted { ok: true }))
}
