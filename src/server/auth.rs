//! Accounts and bearer-token authentication.
//!
//! Every request passes through [`identify`], which resolves an
//! `Authorization: Bearer` header to a [`CurrentUser`]. Routes that need a
//! user add [`require_user`]; the rest treat bad or expired tokens as
//! anonymous.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::Utc;
use inkdraft_core::{Credentials, Me, TokenResponse};

use super::error::{AppError, AppResult};
use super::tokens::{generate_token, hash_password, verify_password};
use super::AppState;
use crate::db::User;

/// The caller behind the request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the bearer token (if any) and stores a [`CurrentUser`] in the
/// request extensions.
pub async fn identify(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).map(str::to_owned);
    let user = match token {
        Some(token) => {
            let user = state.users.user_for_token(&token, Utc::now()).await?;
            if user.is_none() {
                tracing::debug!("Ignoring unknown or expired token");
            }
            user
        }
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Rejects anonymous requests with 401.
pub async fn require_user(request: Request, next: Next) -> Result<Response, AppError> {
    let signed_in = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|u| u.0.is_some());
    if !signed_in {
        return Err(AppError::Unauthorized(
            "Invalid or expired token".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Loose shape check: something before and after a single `@`, and a dot in
/// the domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !email.chars().any(char::is_whitespace)
}

async fn issue_token(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let token = generate_token();
    let expires_at = Utc::now() + state.token_ttl;
    state
        .users
        .create_session(&token, user.id, expires_at)
        .await?;
    Ok(TokenResponse::bearer(token))
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(credentials) = payload?;
    let email = credentials.email.trim();

    if !is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty".to_string()));
    }
    if state.users.get_by_email(email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let user = match state
        .users
        .create(email, &hash_password(&credentials.password))
        .await
    {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "User registered");
    Ok(Json(issue_token(&state, &user).await?))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(credentials) = payload?;

    let user = state
        .users
        .get_by_email(credentials.email.trim())
        .await?
        .filter(|u| verify_password(&credentials.password, &u.password_hash))
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    tracing::debug!(user_id = user.id, "User logged in");
    Ok(Json(issue_token(&state, &user).await?))
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> AppResult<Json<Me>> {
    let user = current
        .0
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    Ok(Json(Me {
        id: user.id,
        email: user.email,
    }))
}
