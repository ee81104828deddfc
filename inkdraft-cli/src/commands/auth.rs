//! Authentication commands for the inkdraft CLI.
//!
//! Signup and login exchange email/password for a bearer token, which is
//! stored under `auth.token` in the config file.

use clap::{Args, Subcommand};
use inkdraft_core::{ApiClient, ApiError, Credentials};
use std::io::{self, BufRead, Write};

use crate::config::{write_token, Config, ConfigError};

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create an account and log in
    Signup {
        /// Email address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Log in with email and password
    Login {
        /// Email address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Log out (remove token from config)
    Logout,
    /// Show authentication status
    Status,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> Result<(), AuthError> {
        match &self.command {
            AuthSubcommand::Signup { email } => authenticate(config, email.clone(), true).await,
            AuthSubcommand::Login { email } => authenticate(config, email.clone(), false).await,
            AuthSubcommand::Logout => logout(config),
            AuthSubcommand::Status => status(config).await,
        }
    }
}

/// Errors that can occur during authentication
#[derive(Debug)]
pub enum AuthError {
    /// I/O error
    IoError(io::Error),
    /// API request failed
    Api(ApiError),
    /// Config file error
    Config(ConfigError),
    /// Required input was empty
    EmptyInput(&'static str),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::IoError(e) => write!(f, "I/O error: {}", e),
            AuthError::Api(e) => write!(f, "{}", e),
            AuthError::Config(e) => write!(f, "Config error: {}", e),
            AuthError::EmptyInput(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::IoError(e)
    }
}

impl From<ApiError> for AuthError {
    fn from(e: ApiError) -> Self {
        AuthError::Api(e)
    }
}

impl From<ConfigError> for AuthError {
    fn from(e: ConfigError) -> Self {
        AuthError::Config(e)
    }
}

fn prompt(label: &str) -> Result<String, io::Error> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn authenticate(config: &Config, email: Option<String>, signup: bool) -> Result<(), AuthError> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt("Email")?,
    };
    if email.is_empty() {
        return Err(AuthError::EmptyInput("Email"));
    }
    let password = prompt("Password")?;
    if password.is_empty() {
        return Err(AuthError::EmptyInput("Password"));
    }

    let client = ApiClient::new(config.api_url.value.clone(), None);
    let credentials = Credentials { email, password };
    let response = if signup {
        client.signup(&credentials).await?
    } else {
        client.login(&credentials).await?
    };

    let path = config.target_path();
    write_token(&path, Some(&response.access_token))?;
    tracing::debug!(path = %path.display(), "token saved");

    if signup {
        println!("Account created. Logged in as {}", credentials.email);
    } else {
        println!("Logged in as {}", credentials.email);
    }
    Ok(())
}

fn logout(config: &Config) -> Result<(), AuthError> {
    let path = config.target_path();
    if !path.exists() {
        println!("Already logged out (no config file).");
        return Ok(());
    }
    write_token(&path, None)?;
    println!("Logged out.");
    Ok(())
}

/// Masks a token for display, keeping four characters at each end.
fn mask(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "****".to_string()
    }
}

async fn status(config: &Config) -> Result<(), AuthError> {
    let Some(token) = config.auth.token.as_deref().filter(|t| !t.is_empty()) else {
        println!("Not logged in. Run 'ink auth login' to authenticate.");
        return Ok(());
    };

    let client = ApiClient::new(config.api_url.value.clone(), Some(token.to_string()));
    match client.me().await {
        Ok(me) => println!("Logged in as {} (token: {})", me.email, mask(token)),
        Err(ApiError::Server { status: 401, .. }) => {
            println!("Token expired or revoked. Run 'ink auth login' again.")
        }
        Err(e) => {
            tracing::warn!("Could not verify token: {}", e);
            println!("Token stored ({}), server unreachable.", mask(token));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_token() {
        assert_eq!(mask("abcdefghijkl"), "abcd...ijkl");
    }

    #[test]
    fn test_mask_short_token() {
        assert_eq!(mask("abc"), "****");
    }
}
