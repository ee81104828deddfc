mod ai;
mod auth;
mod config_cmd;
mod edit;
mod post;

use clap::ValueEnum;
use inkdraft_core::ApiClient;

use crate::config::Config;

pub use ai::AiCommand;
pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use edit::EditCommand;
pub use post::PostCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// API client carrying the configured URL and token.
pub fn api_client(config: &Config) -> ApiClient {
    ApiClient::new(config.api_url.value.clone(), config.auth.token.clone())
}
