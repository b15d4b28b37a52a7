use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scoring::ScoringConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "hh-scout/0.1 (hh-scout@example.com)";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    /// Default log filter when RUST_LOG is not set, e.g. "info"
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub vacancies: Vec<VacancyConfig>,
}

impl Config {
    /// Look up a vacancy by name (case-insensitive)
    pub fn vacancy(&self, name: &str) -> Option<&VacancyConfig> {
        self.vacancies
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Replace the vacancy with the same name, or append it.
    /// Returns true when an existing vacancy was replaced.
    pub fn upsert_vacancy(&mut self, vacancy: VacancyConfig) -> bool {
        match self
            .vacancies
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(vacancy.name.trim()))
        {
            Some(existing) => {
                *existing = vacancy;
                true
            }
            None => {
                self.vacancies.push(vacancy);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// hh.ru rejects requests without an "AppName/Version (contact)" agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause between page requests, humantime format
    #[serde(default = "default_request_delay")]
    pub request_delay: String,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// How long cached GET responses stay valid, humantime format
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_delay: default_request_delay(),
            per_page: default_per_page(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl ApiConfig {
    pub fn request_delay(&self) -> Result<Duration> {
        humantime::parse_duration(self.request_delay.trim())
            .with_context(|| format!("Invalid api.request_delay '{}'", self.request_delay))
    }

    pub fn cache_ttl(&self) -> Result<Duration> {
        humantime::parse_duration(self.cache_ttl.trim())
            .with_context(|| format!("Invalid api.cache_ttl '{}'", self.cache_ttl))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_delay() -> String {
    "500ms".to_string()
}

fn default_per_page() -> u32 {
    20
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VacancyConfig {
    pub name: String,

    /// Id of the published hh.ru vacancy, needed for invitations
    #[serde(default)]
    pub hh_vacancy_id: Option<String>,

    /// Invitation text. `{name}` and `{vacancy}` are substituted.
    #[serde(default)]
    pub invite_message: Option<String>,

    pub search: SearchParams,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    pub scoring: ScoringConfig,
}

fn default_max_results() -> usize {
    100
}

/// Résumé search filters, named after the hh.ru query parameters.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SearchParams {
    pub text: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub employment: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub salary_from: Option<u64>,
    #[serde(default)]
    pub salary_to: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    /// Only résumés updated within this many days
    #[serde(default)]
    pub resume_search_period: Option<u32>,
}

impl SearchParams {
    /// Query pairs for the résumé search, skipping unset and blank values
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("text", self.text.trim().to_string())];
        let optional = [
            ("area", self.area.clone()),
            ("experience", self.experience.clone()),
            ("employment", self.employment.clone()),
            ("schedule", self.schedule.clone()),
            ("salary_from", self.salary_from.map(|v| v.to_string())),
            ("salary_to", self.salary_to.map(|v| v.to_string())),
            ("currency", self.currency.clone()),
            ("order_by", self.order_by.clone()),
            (
                "resume_search_period",
                self.resume_search_period.map(|v| v.to_string()),
            ),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    pairs.push((key, value));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let yaml = r#"
vacancies:
  - name: backend-go
    search:
      text: golang developer
    scoring:
      experience: { weight: 30, required_level: between1And3 }
      skills: { weight: 25, required: [Go] }
      salary: { weight: 15 }
      education: { weight: 10 }
      job_search_status: { weight: 10 }
      bonus: { weight: 10 }
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.api, ApiConfig::default());
        assert_eq!(config.vacancies.len(), 1);

        let vacancy = config.vacancy("Backend-Go").unwrap();
        assert_eq!(vacancy.max_results, 100);
        assert_eq!(vacancy.search.text, "golang developer");
        assert!(vacancy.hh_vacancy_id.is_none());
    }

    #[test]
    fn test_api_durations() {
        let api = ApiConfig::default();
        assert_eq!(api.request_delay().unwrap(), Duration::from_millis(500));
        assert_eq!(api.cache_ttl().unwrap(), Duration::from_secs(3600));

        let bad = ApiConfig {
            request_delay: "slowly".to_string(),
            ..ApiConfig::default()
        };
        assert!(bad.request_delay().is_err());
    }

    #[test]
    fn test_query_pairs_skip_empty_values() {
        let params = SearchParams {
            text: " rust ".to_string(),
            area: Some("1".to_string()),
            experience: Some("".to_string()),
            salary_from: Some(150000),
            resume_search_period: Some(7),
            ..SearchParams::default()
        };
        let pairs = params.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("text", "rust".to_string()),
                ("area", "1".to_string()),
                ("salary_from", "150000".to_string()),
                ("resume_search_period", "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_upsert_vacancy() {
        let vacancy = |name: &str, text: &str| VacancyConfig {
            name: name.to_string(),
            hh_vacancy_id: None,
            invite_message: None,
            search: SearchParams {
                text: text.to_string(),
                ..SearchParams::default()
            },
            max_results: 100,
            scoring: ScoringConfig::default(),
        };

        let mut config = Config::default();
        assert!(!config.upsert_vacancy(vacancy("Backend", "go")));
        assert!(config.upsert_vacancy(vacancy("backend", "golang")));
        assert_eq!(config.vacancies.len(), 1);
        assert_eq!(config.vacancies[0].search.text, "golang");
    }

    #[test]
    fn test_vacancy_without_scoring_is_rejected() {
        let yaml = r#"
vacancies:
  - name: backend-go
    search:
      text: golang developer
"#;
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }
}
