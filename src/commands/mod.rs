pub mod crm;
pub mod report;
pub mod search;
pub mod setup;

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;

use crate::config::{load_config, validate_config, Config, VacancyConfig};
use crate::credentials::CredentialError;
use crate::hh::{get_cache_path, ApiError, DiskCache, HhClient};
use crate::store::{Store, StoreState, TransitionError, VacancyRecord};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_AUTH: i32 = 1;
pub const EXIT_NETWORK: i32 = 2;
pub const EXIT_CONFIG: i32 = 4;
pub const EXIT_OTHER: i32 = 5;

/// Global options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
    pub no_cache: bool,
    pub verbose: bool,
}

/// Configuration could not be loaded or failed validation
#[derive(Debug)]
pub struct ConfigError {
    pub messages: Vec<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.messages.as_slice() {
            [only] => write!(f, "Config error: {}", only),
            many => {
                write!(f, "Config errors:")?;
                for message in many {
                    write!(f, "\n  - {}", message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Pick the process exit code for a failed command
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return if api.is_auth() { EXIT_AUTH } else { EXIT_NETWORK };
        }
        if cause.downcast_ref::<CredentialError>().is_some() {
            return EXIT_AUTH;
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
        if cause.downcast_ref::<reqwest::Error>().is_some() {
            return EXIT_NETWORK;
        }
        if cause.downcast_ref::<TransitionError>().is_some() {
            return EXIT_OTHER;
        }
    }
    EXIT_OTHER
}

impl Context {
    /// Load and validate the config file. Every problem is reported at once.
    pub fn config(&self) -> Result<Config> {
        let config = load_config(self.config_path.clone()).map_err(|e| ConfigError {
            messages: vec![format!("{:#}", e)],
        })?;
        validate_config(&config).map_err(|messages| ConfigError { messages })?;

        tracing::debug!(vacancies = config.vacancies.len(), "config loaded");
        Ok(config)
    }

    pub fn store(&self) -> Result<Store> {
        Store::open(self.store_path.clone())
    }

    /// Authenticated client, prompting for a token on first run
    pub async fn client(&self, config: &Config) -> Result<HhClient> {
        let token = crate::credentials::setup_token_if_missing().await?;
        self.client_with_token(config, &token)
    }

    pub fn client_with_token(&self, config: &Config, token: &str) -> Result<HhClient> {
        let cache = if self.no_cache {
            tracing::debug!("cache disabled (--no-cache)");
            None
        } else {
            let ttl = config.api.cache_ttl().map_err(|e| ConfigError {
                messages: vec![format!("{:#}", e)],
            })?;
            Some(DiskCache::new(get_cache_path(), ttl))
        };
        HhClient::new(token, &config.api, cache)
    }
}

/// Look up a configured vacancy, listing the known names on a miss
pub fn find_vacancy<'a>(config: &'a Config, name: &str) -> Result<&'a VacancyConfig> {
    config.vacancy(name).ok_or_else(|| {
        let known: Vec<&str> = config.vacancies.iter().map(|v| v.name.as_str()).collect();
        anyhow::Error::new(ConfigError {
            messages: vec![if known.is_empty() {
                format!("No vacancy named '{}': the config has no vacancies", name)
            } else {
                format!(
                    "No vacancy named '{}'. Known vacancies: {}",
                    name,
                    known.join(", ")
                )
            }],
        })
    })
}

/// Look up a vacancy that has been searched at least once
pub fn stored_vacancy<'a>(state: &'a StoreState, name: &str) -> Result<&'a VacancyRecord> {
    state.vacancy_by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "No stored results for vacancy '{}'. Run `hh-scout search {}` first",
            name,
            name
        )
    })
}
