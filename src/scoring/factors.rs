use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Experience buckets, ordered from least to most experienced.
/// Serialized with the hh.ru experience ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExperienceLevel {
    NoExperience,
    Between1And3,
    Between3And6,
    MoreThan6,
}

impl ExperienceLevel {
    /// Bucket for a total experience in months: [0,12), [12,36), [36,72), [72,..)
    pub fn from_months(months: u32) -> Self {
        match months {
            0..=11 => ExperienceLevel::NoExperience,
            12..=35 => ExperienceLevel::Between1And3,
            36..=71 => ExperienceLevel::Between3And6,
            _ => ExperienceLevel::MoreThan6,
        }
    }

    /// Parse an hh.ru experience id ("between1And3") or its snake_case form
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "noexperience" => Ok(ExperienceLevel::NoExperience),
            "between1and3" => Ok(ExperienceLevel::Between1And3),
            "between3and6" => Ok(ExperienceLevel::Between3And6),
            "morethan6" => Ok(ExperienceLevel::MoreThan6),
            _ => bail!("Unknown experience level: {}", s),
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::NoExperience => "noExperience",
            ExperienceLevel::Between1And3 => "between1And3",
            ExperienceLevel::Between3And6 => "between3And6",
            ExperienceLevel::MoreThan6 => "moreThan6",
        }
    }
}

/// Coarse three-tier education signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationTier {
    Higher,
    Secondary,
    Unknown,
}

impl EducationTier {
    /// Classify an hh.ru education level id or a free-form description.
    pub fn classify(raw: &str) -> Self {
        let s = normalize_term(raw).replace(['_', '-'], " ");
        if s.is_empty() {
            return EducationTier::Unknown;
        }

        // Unfinished higher education only counts as the middle tier
        if s.contains("unfinished") || s.contains("incomplete") || s.contains("неоконченное") {
            return EducationTier::Secondary;
        }

        const HIGHER: [&str; 9] = [
            "higher", "bachelor", "master", "candidate", "doctor", "высшее", "бакалавр",
            "магистр", "кандидат",
        ];
        const SECONDARY: [&str; 6] = [
            "secondary", "vocational", "college", "среднее", "колледж", "техникум",
        ];

        if HIGHER.iter().any(|k| s.contains(k)) {
            EducationTier::Higher
        } else if SECONDARY.iter().any(|k| s.contains(k)) {
            EducationTier::Secondary
        } else {
            EducationTier::Unknown
        }
    }

    /// Share of the factor weight this tier earns
    pub fn share(self) -> f64 {
        match self {
            EducationTier::Higher => 1.0,
            EducationTier::Secondary => 0.5,
            EducationTier::Unknown => 0.0,
        }
    }
}

/// How actively the candidate is looking for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchActivity {
    Active,
    Passive,
    NotLooking,
}

impl SearchActivity {
    /// Classify an hh.ru job search status id or a free-form description.
    pub fn classify(raw: &str) -> Self {
        let s = normalize_term(raw).replace(['_', '-'], " ");

        // Negative statuses first: "not looking" also contains "looking"
        if s.starts_with("not ")
            || s.contains("accepted")
            || s.contains("не ищу")
            || s.contains("не рассматриваю")
        {
            return SearchActivity::NotLooking;
        }

        if s.contains("active") || s.contains("immediately") || s.contains("активно") {
            SearchActivity::Active
        } else if s.contains("offer")
            || s.contains("passive")
            || s.contains("open to")
            || s.contains("рассматривает")
        {
            SearchActivity::Passive
        } else {
            SearchActivity::NotLooking
        }
    }

    pub fn share(self) -> f64 {
        match self {
            SearchActivity::Active => 1.0,
            SearchActivity::Passive => 0.5,
            SearchActivity::NotLooking => 0.0,
        }
    }
}

/// Lowercase, trim and collapse inner whitespace so "  Node.JS " == "node.js"
pub fn normalize_term(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True if `needle` occurs in `haystack` as a whole term, i.e. not glued to
/// neighbouring letters or digits. Both sides must already be normalized.
/// "go" matches "go, rust" but not "google".
pub fn contains_term(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();

        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());

        if before_ok && after_ok {
            return true;
        }

        // Advance by one char to keep slicing on a char boundary
        start = begin
            + haystack[begin..]
                .chars()
                .next()
                .map_or(1, |c| c.len_utf8());
    }
    false
}

/// Currency codes that mean the same thing (hh.ru still uses "RUR")
pub fn same_currency(a: &str, b: &str) -> bool {
    let canon = |c: &str| {
        let c = c.trim().to_ascii_uppercase();
        if c == "RUR" {
            "RUB".to_string()
        } else {
            c
        }
    };
    canon(a) == canon(b)
}

/// Parse a freshness window such as "14d" or "2weeks"
pub fn parse_window(s: &str) -> Result<Duration> {
    Ok(humantime::parse_duration(s.trim())?)
}

/// Whole days covered by a window (a partial day does not count)
pub fn window_days(window: Duration) -> i64 {
    (window.as_secs() / 86_400) as i64
}
