pub mod prompt;

use keyring::Entry;
use std::fmt;

const SERVICE_NAME: &str = "hh-scout";
const TOKEN_KEY: &str = "hh-token";

/// Environment variable name for providing an hh.ru token without keyring
pub const ENV_TOKEN_VAR: &str = "HH_SCOUT_TOKEN";

pub use prompt::{prompt_for_token, reprompt_for_token, setup_token_if_missing};

/// Check for an hh.ru token in the HH_SCOUT_TOKEN environment variable.
/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env() -> Option<String> {
    non_empty(std::env::var(ENV_TOKEN_VAR).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub enum CredentialError {
    KeyringUnavailable(String),
    TokenNotFound,
    StoreFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::KeyringUnavailable(msg) => write!(f, "Keyring unavailable: {}", msg),
            CredentialError::TokenNotFound => write!(f, "Token not found in keyring"),
            CredentialError::StoreFailed(msg) => write!(f, "Failed to store token: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

fn entry() -> Result<Entry, CredentialError> {
    Entry::new(SERVICE_NAME, TOKEN_KEY)
        .map_err(|e| CredentialError::KeyringUnavailable(format!("{}", e)))
}

fn get_token_sync() -> Result<String, CredentialError> {
    entry()?.get_password().map_err(|e| match e {
        keyring::Error::NoEntry => CredentialError::TokenNotFound,
        _ => CredentialError::KeyringUnavailable(format!("{}", e)),
    })
}

fn store_token_sync(token: &str) -> Result<(), CredentialError> {
    entry()?
        .set_password(token)
        .map_err(|e| CredentialError::StoreFailed(format!("{}", e)))
}

fn delete_token_sync() -> Result<(), CredentialError> {
    match entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(CredentialError::KeyringUnavailable(format!("{}", e))),
    }
}

/// Retrieve the token from the system keyring.
/// Uses spawn_blocking to prevent blocking the async runtime
pub async fn get_token() -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(get_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Store the token in the system keyring
pub async fn store_token(token: String) -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(move || store_token_sync(&token))
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Remove the token from the system keyring. Missing entries are not an error.
pub async fn delete_token() -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(delete_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}
