pub mod init;
mod schema;

pub use schema::{ApiConfig, Config, SearchParams, VacancyConfig, DEFAULT_BASE_URL};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::scoring::validate_scoring;

/// Get the config directory path (~/.config/hh-scout/)
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hh-scout")
}

/// Get the default config file path (~/.config/hh-scout/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/hh-scout/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed (including a vacancy without a scoring section
///   or a non-numeric weight)
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `hh-scout init` to create one",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    Ok(config)
}

/// Validate the whole configuration at startup, before anything is scored.
/// Returns all validation errors at once.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = config.api.request_delay() {
        errors.push(format!("api.request_delay: {:#}", e));
    }
    if let Err(e) = config.api.cache_ttl() {
        errors.push(format!("api.cache_ttl: {:#}", e));
    }
    if config.api.per_page == 0 || config.api.per_page > 100 {
        errors.push(format!(
            "api.per_page: must be between 1 and 100, got {}",
            config.api.per_page
        ));
    }

    let mut names = HashSet::new();
    for (i, vacancy) in config.vacancies.iter().enumerate() {
        let prefix = format!("vacancies[{}]", i);

        if vacancy.name.trim().is_empty() {
            errors.push(format!("{}.name: must not be empty", prefix));
        } else if !names.insert(vacancy.name.trim().to_lowercase()) {
            errors.push(format!(
                "{}.name: duplicate vacancy name '{}'",
                prefix, vacancy.name
            ));
        }

        if vacancy.search.text.trim().is_empty() {
            errors.push(format!("{}.search.text: must not be empty", prefix));
        }
        if vacancy.max_results == 0 {
            errors.push(format!("{}.max_results: must be positive", prefix));
        }

        if let Err(scoring_errors) = validate_scoring(&format!("{}.scoring", prefix), &vacancy.scoring)
        {
            errors.extend(scoring_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringConfig;

    fn vacancy(name: &str) -> VacancyConfig {
        VacancyConfig {
            name: name.to_string(),
            hh_vacancy_id: None,
            invite_message: None,
            search: SearchParams {
                text: "rust".to_string(),
                ..SearchParams::default()
            },
            max_results: 50,
            scoring: ScoringConfig::default(),
        }
    }

    #[test]
    fn test_load_missing_config() {
        let path = std::env::temp_dir().join("hh_scout_test_missing_config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join("hh_scout_test_load_config.yaml");
        let config = Config {
            api: ApiConfig::default(),
            log_level: Some("info".to_string()),
            vacancies: vec![vacancy("backend")],
        };
        fs::write(&path, serde_saphyr::to_string(&config).unwrap()).unwrap();

        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_valid_config() {
        let config = Config {
            api: ApiConfig::default(),
            log_level: None,
            vacancies: vec![vacancy("backend"), vacancy("frontend")],
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_vacancy_names() {
        let config = Config {
            api: ApiConfig::default(),
            log_level: None,
            vacancies: vec![vacancy("backend"), vacancy("Backend")],
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("vacancies[1].name: duplicate"));
    }

    #[test]
    fn test_scoring_errors_carry_vacancy_prefix() {
        let mut bad = vacancy("backend");
        bad.scoring.skills.weight = 0.0;
        bad.search.text = " ".to_string();
        let config = Config {
            api: ApiConfig::default(),
            log_level: None,
            vacancies: vec![bad],
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("vacancies[0].search.text")));
        assert!(errors
            .iter()
            .any(|e| e.starts_with("vacancies[0].scoring.skills.weight")));
    }

    #[test]
    fn test_bad_api_settings() {
        let config = Config {
            api: ApiConfig {
                per_page: 0,
                request_delay: "never".to_string(),
                ..ApiConfig::default()
            },
            log_level: None,
            vacancies: vec![],
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
