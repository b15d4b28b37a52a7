use anyhow::{Context, Result};

use super::{get_token, get_token_from_env, store_token, CredentialError};

/// Prompts user to enter an hh.ru OAuth access token
pub fn prompt_for_token() -> Result<String> {
    println!("hh.ru access token required.");
    println!("Register an employer application at: https://dev.hh.ru/admin");
    println!("The token needs access to résumé search and negotiations.");
    println!();

    let token = rpassword::prompt_password("Enter token: ")
        .context("Failed to read token from stdin")?;

    validate_token(&token)
}

fn validate_token(raw: &str) -> Result<String> {
    let token = raw.trim();
    if token.is_empty() {
        anyhow::bail!("Token cannot be empty");
    }
    if token.chars().any(char::is_whitespace) {
        anyhow::bail!("Token must not contain whitespace");
    }
    Ok(token.to_string())
}

/// Re-prompts for token when the existing one is rejected by hh.ru
pub async fn reprompt_for_token() -> Result<String> {
    eprintln!();
    eprintln!("Your hh.ru token was rejected (invalid or expired).");
    eprintln!("Please provide a new token.");
    eprintln!();

    let token = prompt_for_token()?;

    store_token(token.clone())
        .await
        .context("Failed to store new token in keyring")?;

    eprintln!("New token stored securely in system keyring.");

    Ok(token)
}

/// Resolve the token: environment first, then keyring, then an interactive
/// prompt on first run. Returns the token (either existing or newly stored)
pub async fn setup_token_if_missing() -> Result<String> {
    if let Some(token) = get_token_from_env() {
        tracing::debug!("using token from environment");
        return Ok(token);
    }

    match get_token().await {
        Ok(token) => Ok(token),
        Err(CredentialError::TokenNotFound) => {
            let token = prompt_for_token()?;

            store_token(token.clone())
                .await
                .context("Failed to store token in keyring")?;

            println!("Token stored securely in system keyring.");

            Ok(token)
        }
        Err(e @ CredentialError::KeyringUnavailable(_)) => Err(anyhow::Error::new(e).context(
            format!(
                "System keyring unavailable. Set {} or use a secure keyring \
                (macOS Keychain, Windows Credential Store, or Linux Secret Service)",
                super::ENV_TOKEN_VAR
            ),
        )),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to access keyring")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token() {
        assert_eq!(validate_token("  APPLABC123 \n").unwrap(), "APPLABC123");
        assert!(validate_token("   ").is_err());
        assert!(validate_token("two words").is_err());
    }
}
