//! HTTP client for the inkdraft API server.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ApiError;
use crate::models::{
    AiAction, AiRequest, AiResponse, Credentials, Me, NewPost, Post, PostId, PostStatus,
    PostUpdate, TokenResponse,
};
use crate::remote::PostStore;

/// Timeout for ordinary API calls. AI generation gets a longer one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const AI_TIMEOUT: Duration = Duration::from_secs(60);

/// Error body returned by the server.
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct DeleteResponse {
    ok: bool,
}

/// Client for the REST API.
///
/// The bearer token, when present, is attached to every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .timeout(REQUEST_TIMEOUT);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Maps non-2xx responses to [`ApiError::Server`] using the `detail`
    /// field of the body, falling back to the status text.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let fallback = status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        let detail = match response.json::<ErrorBody>().await {
            Ok(body) if !body.detail.is_empty() => body.detail,
            _ => fallback,
        };

        Err(ApiError::Server {
            status: status.as_u16(),
            detail,
        })
    }

    /// Returns true if the server answers its health check.
    pub async fn health(&self) -> bool {
        match self
            .http
            .get(self.url("/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        Self::send(
            self.request(reqwest::Method::POST, "/api/auth/signup")
                .json(credentials),
        )
        .await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        Self::send(
            self.request(reqwest::Method::POST, "/api/auth/login")
                .json(credentials),
        )
        .await
    }

    pub async fn me(&self) -> Result<Me, ApiError> {
        if self.token.is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        Self::send(self.request(reqwest::Method::GET, "/api/auth/me")).await
    }

    pub async fn generate(&self, text: &str, action: AiAction) -> Result<AiResponse, ApiError> {
        Self::send(
            self.request(reqwest::Method::POST, "/api/ai/generate")
                .timeout(AI_TIMEOUT)
                .json(&AiRequest::new(text, action)),
        )
        .await
    }
}

#[async_trait]
impl PostStore for ApiClient {
    async fn list(&self, status: Option<PostStatus>) -> Result<Vec<Post>, ApiError> {
        let mut builder = self.request(reqwest::Method::GET, "/api/posts/");
        if let Some(status) = status {
            builder = builder.query(&[("status_filter", status.as_str())]);
        }
        Self::send(builder).await
    }

    async fn get(&self, id: PostId) -> Result<Post, ApiError> {
        Self::send(self.request(reqwest::Method::GET, &format!("/api/posts/{}", id))).await
    }

    async fn create(&self, post: &NewPost) -> Result<Post, ApiError> {
        Self::send(self.request(reqwest::Method::POST, "/api/posts/").json(post)).await
    }

    async fn update(&self, id: PostId, fields: &PostUpdate) -> Result<Post, ApiError> {
        Self::send(
            self.request(reqwest::Method::PATCH, &format!("/api/posts/{}", id))
                .json(fields),
        )
        .await
    }

    async fn publish(&self, id: PostId) -> Result<Post, ApiError> {
        Self::send(self.request(
            reqwest::Method::POST,
            &format!("/api/posts/{}/publish", id),
        ))
        .await
    }

    async fn delete(&self, id: PostId) -> Result<(), ApiError> {
        let response: DeleteResponse =
            Self::send(self.request(reqwest::Method::DELETE, &format!("/api/posts/{}", id)))
                .await?;
        if response.ok {
            Ok(())
        } else {
            Err(ApiError::Decode("delete was not acknowledged".to_string()))
        }
    }
}
