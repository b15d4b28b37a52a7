use serde::{Deserialize, Serialize};

use super::factors::ExperienceLevel;

/// Per-vacancy scoring configuration.
///
/// Every factor carries a `weight`, which is the maximum number of points that
/// factor can contribute. Weights do not have to add up to 100; the final score
/// is clamped to 0..=100 regardless.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   experience: { weight: 30, required_level: between1And3 }
///   skills:
///     weight: 25
///     required: ["Go", "PostgreSQL"]
///     bonus: ["Rust", "Kubernetes"]
///   salary:
///     weight: 15
///     optimal: { min: 90000, max: 150000 }
///   education: { weight: 10 }
///   job_search_status: { weight: 10 }
///   bonus:
///     weight: 10
///     keywords: ["open source"]
///     fresh_within: 14d
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub experience: ExperienceConfig,
    pub skills: SkillsConfig,
    pub salary: SalaryConfig,
    pub education: WeightOnly,
    pub job_search_status: WeightOnly,
    pub bonus: BonusConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            experience: ExperienceConfig {
                weight: 30.0,
                required_level: ExperienceLevel::Between1And3,
            },
            skills: SkillsConfig {
                weight: 25.0,
                required: Vec::new(),
                bonus: Vec::new(),
            },
            salary: SalaryConfig {
                weight: 15.0,
                optimal: None,
                currency: None,
            },
            education: WeightOnly { weight: 10.0 },
            job_search_status: WeightOnly { weight: 10.0 },
            bonus: BonusConfig {
                weight: 10.0,
                keywords: Vec::new(),
                fresh_within: None,
                signal_share: default_signal_share(),
            },
        }
    }
}

impl ScoringConfig {
    /// Sum of all factor weights. Informational only, nothing is rescaled by it.
    pub fn total_weight(&self) -> f64 {
        self.experience.weight
            + self.skills.weight
            + self.salary.weight
            + self.education.weight
            + self.job_search_status.weight
            + self.bonus.weight
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExperienceConfig {
    pub weight: f64,
    pub required_level: ExperienceLevel,
}

/// Skill lists are matched case-insensitively.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SkillsConfig {
    pub weight: f64,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub bonus: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SalaryConfig {
    pub weight: f64,

    /// Salary band that earns the full weight. Without a band, any stated
    /// salary counts as a match.
    #[serde(default)]
    pub optimal: Option<SalaryRange>,

    /// Currency of the band (e.g. "RUR"). Expectations in another currency
    /// are treated as unknown.
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Factors that only need a weight (education, job search status).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightOnly {
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BonusConfig {
    pub weight: f64,

    /// Extra positive keywords searched for in the résumé text
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Résumés updated within this window earn one signal.
    /// Format: humantime duration, e.g. "14d", "3weeks"
    #[serde(default)]
    pub fresh_within: Option<String>,

    /// Share of `weight` awarded per distinct signal (0 < share <= 1)
    #[serde(default = "default_signal_share")]
    pub signal_share: f64,
}

fn default_signal_share() -> f64 {
    0.25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.experience.weight, 30.0);
        assert_eq!(config.experience.required_level, ExperienceLevel::Between1And3);
        assert_eq!(config.total_weight(), 100.0);
        assert!(config.salary.optimal.is_none());
        assert_eq!(config.bonus.signal_share, 0.25);
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_full_scoring_config_parse() {
        let yaml = r#"
experience:
  weight: 30
  required_level: between3And6
skills:
  weight: 25
  required: ["Go", "PostgreSQL"]
  bonus: ["Rust"]
salary:
  weight: 15
  optimal:
    min: 90000
    max: 150000
  currency: RUR
education:
  weight: 10
job_search_status:
  weight: 10
bonus:
  weight: 10
  keywords: ["open source"]
  fresh_within: 14d
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.experience.required_level, ExperienceLevel::Between3And6);
        assert_eq!(config.skills.required, vec!["Go", "PostgreSQL"]);
        assert_eq!(
            config.salary.optimal,
            Some(SalaryRange {
                min: 90000.0,
                max: 150000.0
            })
        );
        assert_eq!(config.salary.currency.as_deref(), Some("RUR"));
        assert_eq!(config.bonus.fresh_within.as_deref(), Some("14d"));
        // Not given, falls back to the default share
        assert_eq!(config.bonus.signal_share, 0.25);
    }

    #[test]
    fn test_skill_lists_default_to_empty() {
        let yaml = r#"
experience: { weight: 10, required_level: noExperience }
skills: { weight: 10 }
salary: { weight: 10 }
education: { weight: 10 }
job_search_status: { weight: 10 }
bonus: { weight: 10 }
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert!(config.skills.required.is_empty());
        assert!(config.skills.bonus.is_empty());
        assert!(config.bonus.keywords.is_empty());
    }

    #[test]
    fn test_missing_factor_is_rejected() {
        let yaml = r#"
experience: { weight: 10, required_level: noExperience }
skills: { weight: 10 }
"#;
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_non_numeric_weight_is_rejected() {
        let yaml = r#"
experience: { weight: lots, required_level: noExperience }
skills: { weight: 10 }
salary: { weight: 10 }
education: { weight: 10 }
job_search_status: { weight: 10 }
bonus: { weight: 10 }
"#;
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_salary_range_contains_bounds() {
        let range = SalaryRange {
            min: 100.0,
            max: 200.0,
        };
        assert!(range.contains(100.0));
        assert!(range.contains(200.0));
        assert!(!range.contains(99.9));
        assert!(!range.contains(200.1));
    }
}
