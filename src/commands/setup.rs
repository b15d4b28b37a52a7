use anyhow::{Context as _, Result};

use super::{ConfigError, Context};
use crate::config::init::{run_init_wizard, write_config};
use crate::config::{get_config_path, load_config, Config};
use crate::credentials::{delete_token, prompt_for_token, store_token, ENV_TOKEN_VAR};
use crate::hh::clear_cache;
use crate::scoring::validate_scoring;

pub fn run_init(ctx: &Context) -> Result<()> {
    run_init_wizard(ctx.config_path.clone())
}

/// Store a new token in the keyring, or remove the stored one
pub async fn run_token(clear: bool) -> Result<()> {
    if clear {
        delete_token()
            .await
            .context("Failed to remove token from keyring")?;
        println!("Token removed from system keyring.");
        return Ok(());
    }

    let token = prompt_for_token()?;
    store_token(token)
        .await
        .with_context(|| format!("Failed to store token. Set {} instead", ENV_TOKEN_VAR))?;
    println!("Token stored securely in system keyring.");
    Ok(())
}

/// Accept a bare vacancy id or an hh.ru vacancy link
/// ("https://hh.ru/vacancy/93285763?from=search" -> "93285763")
fn parse_vacancy_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let candidate = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);

    if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
        Ok(candidate.to_string())
    } else {
        anyhow::bail!("'{}' is not an hh.ru vacancy id or link", input)
    }
}

/// Build a vacancy profile from a published hh.ru vacancy and add it to the
/// config, creating the config file when there is none yet
pub async fn run_import_vacancy(ctx: &Context, id_or_url: &str, name: Option<&str>) -> Result<()> {
    let vacancy_id = parse_vacancy_id(id_or_url)?;
    let config_path = ctx.config_path.clone().unwrap_or_else(get_config_path);

    let mut config = if config_path.exists() {
        load_config(Some(config_path.clone())).map_err(|e| ConfigError {
            messages: vec![format!("{:#}", e)],
        })?
    } else {
        Config::default()
    };

    let client = ctx.client(&config).await?;
    let hh_vacancy = client
        .get_vacancy(&vacancy_id)
        .await
        .with_context(|| format!("Failed to fetch vacancy {}", vacancy_id))?;

    let mut vacancy = hh_vacancy.to_vacancy_config();
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        vacancy.name = name.to_string();
    }
    validate_scoring(&format!("{}.scoring", vacancy.name), &vacancy.scoring)
        .map_err(|messages| ConfigError { messages })?;

    let vacancy_name = vacancy.name.clone();
    let replaced = config.upsert_vacancy(vacancy);
    write_config(&config_path, &config)?;

    tracing::info!(hh_vacancy_id = %vacancy_id, name = %vacancy_name, replaced, "vacancy imported");
    println!(
        "{} vacancy '{}' in {}",
        if replaced { "Updated" } else { "Added" },
        vacancy_name,
        config_path.display()
    );
    println!("Run `hh-scout search {}` to find candidates.", vacancy_name);
    Ok(())
}

pub fn run_clear_cache() -> Result<()> {
    clear_cache()?;
    println!("HTTP cache cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vacancy_id() {
        assert_eq!(parse_vacancy_id("93285763").unwrap(), "93285763");
        assert_eq!(
            parse_vacancy_id("https://hh.ru/vacancy/93285763?from=search").unwrap(),
            "93285763"
        );
        assert_eq!(
            parse_vacancy_id(" https://spb.hh.ru/vacancy/42/ ").unwrap(),
            "42"
        );
        assert!(parse_vacancy_id("https://hh.ru/resume/abc").is_err());
        assert!(parse_vacancy_id("").is_err());
    }
}
