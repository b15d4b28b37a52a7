use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::candidate::CandidateInput;
use super::config::{BonusConfig, ExperienceConfig, SalaryConfig, ScoringConfig, SkillsConfig};
use super::factors::{
    contains_term, normalize_term, parse_window, same_currency, window_days, EducationTier,
    ExperienceLevel, SearchActivity,
};

/// Required skills take 80% of the skills weight, bonus skills the rest.
const REQUIRED_SKILLS_SHARE: f64 = 0.8;
const BONUS_SKILLS_SHARE: f64 = 0.2;

/// Experience one bucket below the requirement earns this share.
const ONE_BUCKET_BELOW_SHARE: f64 = 0.5;

/// Unknown salary is neutral rather than a mismatch.
const UNKNOWN_SALARY_SHARE: f64 = 0.5;

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Experience", "Skills"
    pub description: String, // e.g. "24 months (between1And3), required between1And3"
    pub points: u32,         // Points awarded, 0..=weight
    pub weight: f64,         // Configured maximum
}

/// Points per factor. Serialized with the field names the dashboard and the
/// CSV export use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub experience: u32,
    pub skills: u32,
    pub salary: u32,
    pub education: u32,
    pub job_search_status: u32,
    pub bonus: u32,
}

impl ScoreBreakdown {
    /// Sum before clamping. Saturates, since weights have no upper bound.
    pub fn total(&self) -> u32 {
        self.entries()
            .iter()
            .fold(0u32, |sum, (_, points)| sum.saturating_add(*points))
    }

    pub fn entries(&self) -> [(&'static str, u32); 6] {
        [
            ("experience", self.experience),
            ("skills", self.skills),
            ("salary", self.salary),
            ("education", self.education),
            ("jobSearchStatus", self.job_search_status),
            ("bonus", self.bonus),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Average,
    Weak,
}

impl Rating {
    /// Fixed bands: 80+ excellent, 60-79 good, 40-59 average, below 40 weak
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Rating::Excellent,
            60..=79 => Rating::Good,
            40..=59 => Rating::Average,
            _ => Rating::Weak,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Average => "average",
            Rating::Weak => "weak",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoreResult {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub rating: Rating,
    pub stars: u8,
    #[serde(default)]
    pub factors: Vec<FactorContribution>,
}

/// Score one candidate against a vacancy profile.
///
/// Pure and total: no I/O, no clock, and no input makes it fail. Each factor
/// earns between 0 and its weight, rounded to whole points; the score is the
/// sum of those points clamped to 0..=100.
pub fn score_candidate(candidate: &CandidateInput, config: &ScoringConfig) -> ScoreResult {
    let candidate_skills: HashSet<String> = normalized_set(&candidate.skills);
    let mut factors = Vec::with_capacity(6);

    let (raw, description) = experience_share(candidate.experience_months, &config.experience);
    let experience = push_factor(&mut factors, "Experience", description, raw, config.experience.weight);

    let (raw, description) = skills_share(&candidate_skills, &config.skills);
    let skills = push_factor(&mut factors, "Skills", description, raw, config.skills.weight);

    let (raw, description) = salary_share(candidate, &config.salary);
    let salary = push_factor(&mut factors, "Salary", description, raw, config.salary.weight);

    let tier = candidate
        .education
        .as_deref()
        .map(EducationTier::classify)
        .unwrap_or(EducationTier::Unknown);
    let description = match &candidate.education {
        Some(raw) => format!("'{}' -> {:?}", raw, tier),
        None => "not stated".to_string(),
    };
    let education = push_factor(
        &mut factors,
        "Education",
        description,
        tier.share(),
        config.education.weight,
    );

    let activity = candidate
        .job_search_status
        .as_deref()
        .map(SearchActivity::classify)
        .unwrap_or(SearchActivity::NotLooking);
    let description = match &candidate.job_search_status {
        Some(raw) => format!("'{}' -> {:?}", raw, activity),
        None => "not stated".to_string(),
    };
    let job_search_status = push_factor(
        &mut factors,
        "Job search status",
        description,
        activity.share(),
        config.job_search_status.weight,
    );

    let (raw, description) = bonus_share(candidate, &candidate_skills, config);
    let bonus = push_factor(&mut factors, "Bonus", description, raw, config.bonus.weight);

    let breakdown = ScoreBreakdown {
        experience,
        skills,
        salary,
        education,
        job_search_status,
        bonus,
    };

    // Clamp, never rescale: weights above 100 simply saturate
    let score = breakdown.total().min(MAX_SCORE);

    ScoreResult {
        score,
        breakdown,
        rating: Rating::from_score(score),
        stars: stars_for(score),
        factors,
    }
}

/// 1-5 stars on the same 0-100 scale: ceil(score / 20), at least one star
pub fn stars_for(score: u32) -> u8 {
    score.min(MAX_SCORE).div_ceil(20).clamp(1, 5) as u8
}

/// Sort by score, highest first. The sort is stable, so candidates with equal
/// scores keep the order they were fetched in.
pub fn sort_by_score<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> u32,
{
    items.sort_by(|a, b| score(b).cmp(&score(a)));
}

/// Convert a share of the weight into whole points, within 0..=weight
fn points(share: f64, weight: f64) -> u32 {
    let weight = effective_weight(weight);
    (share.clamp(0.0, 1.0) * weight).round() as u32
}

/// Negative or non-finite weights contribute nothing (validation rejects them)
fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn push_factor(
    factors: &mut Vec<FactorContribution>,
    label: &str,
    description: String,
    share: f64,
    weight: f64,
) -> u32 {
    let awarded = points(share, weight);
    factors.push(FactorContribution {
        label: label.to_string(),
        description,
        points: awarded,
        weight,
    });
    awarded
}

fn experience_share(months: Option<u32>, config: &ExperienceConfig) -> (f64, String) {
    let required = config.required_level;

    match months.filter(|m| *m > 0) {
        None => {
            let share = if required == ExperienceLevel::NoExperience {
                1.0
            } else {
                0.0
            };
            (
                share,
                format!("not stated, required {}", required.as_str()),
            )
        }
        Some(months) => {
            let level = ExperienceLevel::from_months(months);
            let gap = required.rank() as i16 - level.rank() as i16;
            let share = match gap {
                g if g <= 0 => 1.0,
                1 => ONE_BUCKET_BELOW_SHARE,
                _ => 0.0,
            };
            (
                share,
                format!(
                    "{} months ({}), required {}",
                    months,
                    level.as_str(),
                    required.as_str()
                ),
            )
        }
    }
}

fn skills_share(candidate_skills: &HashSet<String>, config: &SkillsConfig) -> (f64, String) {
    let required = normalized_list(&config.required);
    let bonus = normalized_list(&config.bonus);

    let matched_required = required.iter().filter(|s| candidate_skills.contains(*s)).count();
    let matched_bonus = bonus.iter().filter(|s| candidate_skills.contains(*s)).count();

    // Nothing mandatory configured: nobody is penalized for it
    let required_fraction = fraction(matched_required, required.len());
    let bonus_fraction = fraction(matched_bonus, bonus.len());

    let share = (REQUIRED_SKILLS_SHARE * required_fraction + BONUS_SKILLS_SHARE * bonus_fraction)
        .min(1.0);

    (
        share,
        format!(
            "required {}/{}, bonus {}/{}",
            matched_required,
            required.len(),
            matched_bonus,
            bonus.len()
        ),
    )
}

fn fraction(matched: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        matched as f64 / total as f64
    }
}

fn salary_share(candidate: &CandidateInput, config: &SalaryConfig) -> (f64, String) {
    let Some(expectation) = &candidate.salary else {
        return (UNKNOWN_SALARY_SHARE, "not stated".to_string());
    };

    if let (Some(wanted), Some(offered)) = (&expectation.currency, &config.currency) {
        if !same_currency(wanted, offered) {
            return (
                UNKNOWN_SALARY_SHARE,
                format!("asked in {}, band in {}", wanted, offered),
            );
        }
    }

    let Some(amount) = expectation.expected_amount() else {
        return (UNKNOWN_SALARY_SHARE, "not stated".to_string());
    };

    let Some(range) = config.optimal else {
        return (1.0, format!("{} (no band configured)", amount));
    };

    if range.contains(amount) {
        return (1.0, format!("{} within {}-{}", amount, range.min, range.max));
    }

    // Linear decay by relative distance from the nearest bound
    let (distance, bound, side) = if amount < range.min {
        (range.min - amount, range.min, "below")
    } else {
        (amount - range.max, range.max, "above")
    };
    let share = if bound > 0.0 {
        (1.0 - distance / bound).max(0.0)
    } else {
        0.0
    };

    (
        share,
        format!("{} {} {}-{} by {}", amount, side, range.min, range.max, distance),
    )
}

fn bonus_share(
    candidate: &CandidateInput,
    candidate_skills: &HashSet<String>,
    config: &ScoringConfig,
) -> (f64, String) {
    let bonus: &BonusConfig = &config.bonus;
    let text: Vec<String> = candidate
        .free_text
        .iter()
        .map(|t| normalize_term(t))
        .filter(|t| !t.is_empty())
        .collect();
    let in_text = |term: &str| text.iter().any(|t| contains_term(t, term));

    let mut seen = HashSet::new();
    let mut signals = Vec::new();

    // Bonus skills already credited by the skills factor don't count twice
    for term in normalized_list(&config.skills.bonus) {
        if !candidate_skills.contains(&term) && in_text(term.as_str()) && seen.insert(term.clone()) {
            signals.push(format!("'{}' in résumé text", term));
        }
    }

    for term in normalized_list(&bonus.keywords) {
        if (candidate_skills.contains(&term) || in_text(term.as_str())) && seen.insert(term.clone()) {
            signals.push(format!("keyword '{}'", term));
        }
    }

    if let (Some(window), Some(days)) = (
        bonus.fresh_within.as_deref().and_then(|w| parse_window(w).ok()),
        candidate.days_since_update,
    ) {
        if (0..=window_days(window)).contains(&days) {
            signals.push(format!("updated {} days ago", days));
        }
    }

    let per_signal = if bonus.signal_share.is_finite() {
        bonus.signal_share.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let share = (signals.len() as f64 * per_signal).min(1.0);

    let description = if signals.is_empty() {
        "no signals".to_string()
    } else {
        signals.join(", ")
    };
    (share, description)
}

fn normalized_set(items: &[String]) -> HashSet<String> {
    items
        .iter()
        .map(|s| normalize_term(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalized, deduplicated, in configuration order
fn normalized_list(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| normalize_term(s))
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{SalaryExpectation, SalaryRange, WeightOnly};

    fn scenario_config() -> ScoringConfig {
        ScoringConfig {
            experience: ExperienceConfig {
                weight: 30.0,
                required_level: ExperienceLevel::Between1And3,
            },
            skills: SkillsConfig {
                weight: 25.0,
                required: vec!["Go".to_string()],
                bonus: vec!["Rust".to_string()],
            },
            salary: SalaryConfig {
                weight: 15.0,
                optimal: Some(SalaryRange {
                    min: 90000.0,
                    max: 150000.0,
                }),
                currency: None,
            },
            education: WeightOnly { weight: 10.0 },
            job_search_status: WeightOnly { weight: 10.0 },
            bonus: BonusConfig {
                weight: 10.0,
                keywords: vec![],
                fresh_within: None,
                signal_share: 0.25,
            },
        }
    }

    fn strong_candidate() -> CandidateInput {
        CandidateInput {
            experience_months: Some(24),
            skills: vec!["Go".to_string(), "Rust".to_string()],
            salary: Some(SalaryExpectation::fixed(120000.0)),
            education: Some("higher".to_string()),
            job_search_status: Some("actively looking".to_string()),
            free_text: vec![],
            days_since_update: None,
        }
    }

    fn with_salary(amount: f64) -> CandidateInput {
        CandidateInput {
            salary: Some(SalaryExpectation::fixed(amount)),
            ..CandidateInput::default()
        }
    }

    #[test]
    fn test_strong_candidate_scenario() {
        let result = score_candidate(&strong_candidate(), &scenario_config());

        assert_eq!(result.breakdown.experience, 30);
        assert_eq!(result.breakdown.skills, 25);
        assert_eq!(result.breakdown.salary, 15);
        assert_eq!(result.breakdown.education, 10);
        assert_eq!(result.breakdown.job_search_status, 10);
        assert_eq!(result.breakdown.bonus, 0);
        assert_eq!(result.score, 90);
        assert_eq!(result.rating, Rating::Excellent);
        assert_eq!(result.stars, 5);
    }

    #[test]
    fn test_empty_candidate_scenario() {
        let candidate = CandidateInput {
            experience_months: Some(0),
            ..CandidateInput::default()
        };
        let result = score_candidate(&candidate, &scenario_config());

        assert_eq!(result.breakdown.experience, 0);
        assert_eq!(result.breakdown.skills, 0);
        // 15 / 2 = 7.5 rounds half away from zero
        assert_eq!(result.breakdown.salary, 8);
        assert_eq!(result.breakdown.education, 0);
        assert_eq!(result.breakdown.job_search_status, 0);
        assert_eq!(result.breakdown.bonus, 0);
        assert_eq!(result.score, 8);
        assert_eq!(result.rating, Rating::Weak);
        assert_eq!(result.stars, 1);
    }

    #[test]
    fn test_empty_candidate_stays_in_bounds_for_default_config() {
        let result = score_candidate(&CandidateInput::default(), &ScoringConfig::default());
        assert!(result.score <= MAX_SCORE);
        assert_eq!(result.breakdown.total(), result.score);
        assert_eq!(result.factors.len(), 6);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let config = scenario_config();
        let mut candidate = strong_candidate();
        candidate.free_text = vec!["Rust and Go, open source".to_string()];

        let first = score_candidate(&candidate, &config);
        let second = score_candidate(&candidate, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_experience_is_monotonic_in_months() {
        let config = scenario_config();
        let mut previous = 0;
        for months in 0..=120 {
            let candidate = CandidateInput {
                experience_months: Some(months),
                ..CandidateInput::default()
            };
            let points = score_candidate(&candidate, &config).breakdown.experience;
            assert!(
                points >= previous,
                "experience points dropped at {} months",
                months
            );
            previous = points;
        }
    }

    #[test]
    fn test_experience_one_bucket_below_earns_half() {
        let mut config = scenario_config();
        config.experience.required_level = ExperienceLevel::Between3And6;

        let candidate = CandidateInput {
            experience_months: Some(24),
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&candidate, &config).breakdown.experience, 15);

        let junior = CandidateInput {
            experience_months: Some(6),
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&junior, &config).breakdown.experience, 0);
    }

    #[test]
    fn test_absent_experience_meets_no_experience_requirement() {
        let mut config = scenario_config();
        config.experience.required_level = ExperienceLevel::NoExperience;
        let result = score_candidate(&CandidateInput::default(), &config);
        assert_eq!(result.breakdown.experience, 30);
    }

    #[test]
    fn test_all_skills_earn_full_weight() {
        let candidate = CandidateInput {
            skills: vec!["go".to_string(), " RUST ".to_string()],
            ..CandidateInput::default()
        };
        let result = score_candidate(&candidate, &scenario_config());
        assert_eq!(result.breakdown.skills, 25);
    }

    #[test]
    fn test_no_skills_earn_nothing() {
        let candidate = CandidateInput {
            skills: vec!["PHP".to_string()],
            ..CandidateInput::default()
        };
        let result = score_candidate(&candidate, &scenario_config());
        assert_eq!(result.breakdown.skills, 0);
    }

    #[test]
    fn test_required_skills_dominate() {
        let mut config = scenario_config();
        config.skills.weight = 100.0;

        let required_only = CandidateInput {
            skills: vec!["Go".to_string()],
            ..CandidateInput::default()
        };
        let bonus_only = CandidateInput {
            skills: vec!["Rust".to_string()],
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&required_only, &config).breakdown.skills, 80);
        assert_eq!(score_candidate(&bonus_only, &config).breakdown.skills, 20);
    }

    #[test]
    fn test_empty_required_list_is_not_a_penalty() {
        let mut config = scenario_config();
        config.skills.required.clear();
        config.skills.weight = 100.0;

        let result = score_candidate(&CandidateInput::default(), &config);
        assert_eq!(result.breakdown.skills, 80);
    }

    #[test]
    fn test_salary_band_bounds_are_inclusive() {
        let config = scenario_config();
        assert_eq!(score_candidate(&with_salary(90000.0), &config).breakdown.salary, 15);
        assert_eq!(score_candidate(&with_salary(150000.0), &config).breakdown.salary, 15);
    }

    #[test]
    fn test_salary_decays_with_distance() {
        let config = scenario_config();
        // 50% above max -> half weight
        assert_eq!(score_candidate(&with_salary(225000.0), &config).breakdown.salary, 8);
        // 50% below min -> half weight
        assert_eq!(score_candidate(&with_salary(45000.0), &config).breakdown.salary, 8);
        // far outside -> nothing, never negative
        assert_eq!(score_candidate(&with_salary(1_000_000.0), &config).breakdown.salary, 0);
    }

    #[test]
    fn test_salary_range_midpoint_is_used() {
        let candidate = CandidateInput {
            salary: Some(SalaryExpectation {
                from: Some(100000.0),
                to: Some(140000.0),
                ..SalaryExpectation::default()
            }),
            ..CandidateInput::default()
        };
        let result = score_candidate(&candidate, &scenario_config());
        assert_eq!(result.breakdown.salary, 15);
    }

    #[test]
    fn test_salary_in_other_currency_is_neutral() {
        let mut config = scenario_config();
        config.salary.currency = Some("RUR".to_string());

        let mut candidate = with_salary(120000.0);
        candidate.salary.as_mut().unwrap().currency = Some("USD".to_string());
        assert_eq!(score_candidate(&candidate, &config).breakdown.salary, 8);

        candidate.salary.as_mut().unwrap().currency = Some("RUB".to_string());
        assert_eq!(score_candidate(&candidate, &config).breakdown.salary, 15);
    }

    #[test]
    fn test_salary_without_band_counts_as_match() {
        let mut config = scenario_config();
        config.salary.optimal = None;
        assert_eq!(score_candidate(&with_salary(1.0), &config).breakdown.salary, 15);
    }

    #[test]
    fn test_education_and_status_tiers() {
        let config = scenario_config();
        let candidate = CandidateInput {
            education: Some("special_secondary".to_string()),
            job_search_status: Some("looking_for_offers".to_string()),
            ..CandidateInput::default()
        };
        let result = score_candidate(&candidate, &config);
        assert_eq!(result.breakdown.education, 5);
        assert_eq!(result.breakdown.job_search_status, 5);

        let not_looking = CandidateInput {
            job_search_status: Some("not_looking_for_job".to_string()),
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&not_looking, &config).breakdown.job_search_status, 0);
    }

    #[test]
    fn test_bonus_signals_accumulate_and_cap() {
        let mut config = scenario_config();
        config.bonus.keywords = vec!["open source".to_string(), "mentoring".to_string()];
        config.bonus.fresh_within = Some("14d".to_string());

        let candidate = CandidateInput {
            skills: vec!["Go".to_string()],
            free_text: vec!["Rust hobbyist, open source maintainer".to_string()],
            days_since_update: Some(3),
            ..CandidateInput::default()
        };
        // rust (uncredited bonus skill), "open source", fresh update = 3 signals
        let result = score_candidate(&candidate, &config);
        assert_eq!(result.breakdown.bonus, 8); // 3 * 0.25 * 10 = 7.5

        config.bonus.signal_share = 0.5;
        let result = score_candidate(&candidate, &config);
        assert_eq!(result.breakdown.bonus, 10);
    }

    #[test]
    fn test_bonus_skill_already_credited_does_not_count_twice() {
        let config = scenario_config();
        let candidate = CandidateInput {
            skills: vec!["Rust".to_string()],
            free_text: vec!["Rust everywhere".to_string()],
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&candidate, &config).breakdown.bonus, 0);
    }

    #[test]
    fn test_stale_resume_earns_no_freshness_signal() {
        let mut config = scenario_config();
        config.bonus.fresh_within = Some("7d".to_string());
        let candidate = CandidateInput {
            days_since_update: Some(30),
            ..CandidateInput::default()
        };
        assert_eq!(score_candidate(&candidate, &config).breakdown.bonus, 0);
    }

    #[test]
    fn test_score_is_clamped_not_rescaled() {
        let mut config = scenario_config();
        config.experience.weight = 50.0;
        config.skills.weight = 50.0;
        config.salary.weight = 50.0;
        config.education.weight = 50.0;
        config.job_search_status.weight = 50.0;
        config.bonus.weight = 50.0;
        config.bonus.keywords = vec!["kafka".to_string()];
        config.bonus.signal_share = 1.0;

        let mut candidate = strong_candidate();
        candidate.free_text = vec!["Kafka streams".to_string()];

        let result = score_candidate(&candidate, &config);
        assert_eq!(result.breakdown.total(), 300);
        assert_eq!(result.score, 100);
        assert_eq!(result.rating, Rating::Excellent);
    }

    #[test]
    fn test_huge_weights_saturate_at_max_score() {
        let mut config = scenario_config();
        config.experience.weight = 3e9;
        config.skills.weight = 3e9;
        config.salary.weight = 3e9;
        config.education.weight = 3e9;
        config.job_search_status.weight = 3e9;
        config.bonus.weight = 3e9;
        assert!(crate::scoring::validate_scoring("scoring", &config).is_ok());

        let result = score_candidate(&strong_candidate(), &config);
        assert_eq!(result.breakdown.total(), u32::MAX);
        assert_eq!(result.score, 100);
        assert_eq!(result.rating, Rating::Excellent);

        // Two factors whose sum would wrap past u32::MAX
        let mut config = scenario_config();
        config.experience.weight = 2_147_483_648.0;
        config.education.weight = 2_147_483_658.0;
        let result = score_candidate(&strong_candidate(), &config);
        assert_eq!(result.score, 100);
        assert_eq!(result.stars, 5);
    }

    #[test]
    fn test_negative_weight_contributes_nothing() {
        let mut config = scenario_config();
        config.education.weight = -10.0;
        let result = score_candidate(&strong_candidate(), &config);
        assert_eq!(result.breakdown.education, 0);
    }

    #[test]
    fn test_rating_band_boundaries() {
        assert_eq!(Rating::from_score(100), Rating::Excellent);
        assert_eq!(Rating::from_score(80), Rating::Excellent);
        assert_eq!(Rating::from_score(79), Rating::Good);
        assert_eq!(Rating::from_score(60), Rating::Good);
        assert_eq!(Rating::from_score(59), Rating::Average);
        assert_eq!(Rating::from_score(40), Rating::Average);
        assert_eq!(Rating::from_score(39), Rating::Weak);
        assert_eq!(Rating::from_score(0), Rating::Weak);
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars_for(0), 1);
        assert_eq!(stars_for(20), 1);
        assert_eq!(stars_for(21), 2);
        assert_eq!(stars_for(60), 3);
        assert_eq!(stars_for(80), 4);
        assert_eq!(stars_for(81), 5);
        assert_eq!(stars_for(100), 5);
    }

    #[test]
    fn test_sort_by_score_keeps_fetch_order_for_ties() {
        let mut items = vec![("a", 50), ("b", 70), ("c", 50), ("d", 70), ("e", 10)];
        sort_by_score(&mut items, |item| item.1);
        let order: Vec<&str> = items.iter().map(|i| i.0).collect();
        assert_eq!(order, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_breakdown_serializes_with_dashboard_names() {
        let result = score_candidate(&strong_candidate(), &scenario_config());
        let json = serde_json::to_value(result.breakdown).unwrap();
        assert_eq!(json["jobSearchStatus"], 10);
        assert_eq!(serde_json::to_value(result.rating).unwrap(), "excellent");
    }
}
