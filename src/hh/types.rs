use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{SearchParams, VacancyConfig};
use crate::scoring::{
    CandidateInput, ExperienceLevel, SalaryExpectation, SalaryRange, ScoringConfig,
};

/// hh.ru sends `null` for some list fields; treat it as an empty list
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IdName {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Salary {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TotalExperience {
    pub months: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Education {
    #[serde(default)]
    pub level: Option<IdName>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Contact {
    #[serde(rename = "type")]
    pub kind: IdName,
    /// A plain string for emails, an object for phones
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A résumé as returned by `GET /resumes` and `GET /resumes/{id}`.
/// Only the fields this tool uses are mapped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Resume {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alternate_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub area: Option<IdName>,
    #[serde(default)]
    pub salary: Option<Salary>,
    #[serde(default)]
    pub total_experience: Option<TotalExperience>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skill_set: Vec<String>,
    /// Free-form "about me" text
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub education: Option<Education>,
    #[serde(default)]
    pub job_search_status: Option<IdName>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contact: Vec<Contact>,
}

/// Display-oriented view of a résumé, stored with the candidate
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResumeSummary {
    pub id: String,
    pub full_name: String,
    pub title: String,
    pub age: Option<u32>,
    pub city: String,
    pub salary: String,
    pub experience: String,
    pub skills: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resume_url: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Resume {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_hh_timestamp)
    }

    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.last_name, &self.first_name, &self.middle_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn email(&self) -> Option<String> {
        self.contact
            .iter()
            .find(|c| c.kind.id == "email")
            .and_then(|c| c.value.as_str().map(str::to_string))
    }

    pub fn phone(&self) -> Option<String> {
        self.contact
            .iter()
            .find(|c| c.kind.id == "cell")
            .and_then(|c| {
                let value = c.value.as_object()?;
                if let Some(formatted) = value.get("formatted").and_then(|v| v.as_str()) {
                    return Some(formatted.to_string());
                }
                let part = |key: &str| value.get(key).and_then(|v| v.as_str()).unwrap_or("");
                Some(format!("+{}{}{}", part("country"), part("city"), part("number")))
            })
    }

    /// Map the résumé into scoring input. `as_of` is the reference time for
    /// freshness, so scoring itself never reads the clock.
    pub fn to_candidate_input(&self, as_of: DateTime<Utc>) -> CandidateInput {
        let mut free_text = Vec::new();
        if let Some(title) = &self.title {
            free_text.push(title.clone());
        }
        if let Some(about) = &self.skills {
            free_text.push(about.clone());
        }
        for entry in &self.experience {
            free_text.extend(entry.position.iter().cloned());
            free_text.extend(entry.description.iter().cloned());
        }

        CandidateInput {
            experience_months: self.total_experience.as_ref().map(|t| t.months),
            skills: self.skill_set.clone(),
            salary: self.salary.as_ref().map(|s| SalaryExpectation {
                amount: s.amount,
                from: s.from,
                to: s.to,
                currency: s.currency.clone(),
            }),
            education: self
                .education
                .as_ref()
                .and_then(|e| e.level.as_ref())
                .map(|level| level.id.clone()),
            job_search_status: self.job_search_status.as_ref().map(|s| s.id.clone()),
            free_text,
            days_since_update: self.updated_at().map(|updated| (as_of - updated).num_days()),
        }
    }

    pub fn summary(&self) -> ResumeSummary {
        ResumeSummary {
            id: self.id.clone(),
            full_name: self.full_name().unwrap_or_else(|| "(name hidden)".to_string()),
            title: self
                .title
                .clone()
                .unwrap_or_else(|| "(no title)".to_string()),
            age: self.age,
            city: self
                .area
                .as_ref()
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| "-".to_string()),
            salary: format_salary(self.salary.as_ref()),
            experience: format_experience(self.total_experience.as_ref().map(|t| t.months)),
            skills: self.skill_set.clone(),
            updated_at: self.updated_at(),
            resume_url: self.alternate_url.clone().unwrap_or_default(),
            email: self.email(),
            phone: self.phone(),
        }
    }
}

/// One page of `GET /resumes`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResumePage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Resume>,
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeySkill {
    pub name: String,
}

/// A published vacancy (`GET /vacancies/{id}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HhVacancy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub area: Option<IdName>,
    #[serde(default)]
    pub salary: Option<Salary>,
    #[serde(default)]
    pub experience: Option<IdName>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_skills: Vec<KeySkill>,
    #[serde(default)]
    pub alternate_url: Option<String>,
}

impl HhVacancy {
    /// Build a vacancy profile from a published vacancy: key skills become
    /// required skills, the salary fork becomes the optimal band.
    pub fn to_vacancy_config(&self) -> VacancyConfig {
        let mut scoring = ScoringConfig::default();

        if let Some(level) = self
            .experience
            .as_ref()
            .and_then(|e| ExperienceLevel::parse(&e.id).ok())
        {
            scoring.experience.required_level = level;
        }
        scoring.skills.required = self.key_skills.iter().map(|s| s.name.clone()).collect();

        if let Some(salary) = &self.salary {
            scoring.salary.optimal = match (salary.from, salary.to) {
                (Some(min), Some(max)) => Some(SalaryRange { min, max }),
                (Some(min), None) => Some(SalaryRange { min, max: min * 1.2 }),
                (None, Some(max)) => Some(SalaryRange { min: max * 0.8, max }),
                (None, None) => None,
            };
            scoring.salary.currency = salary.currency.clone();
        }

        VacancyConfig {
            name: self.name.clone(),
            hh_vacancy_id: Some(self.id.clone()),
            invite_message: None,
            search: SearchParams {
                text: self.name.clone(),
                area: self.area.as_ref().map(|a| a.id.clone()),
                experience: self.experience.as_ref().map(|e| e.id.clone()),
                salary_from: self.salary.as_ref().and_then(|s| s.from).map(|v| v as u64),
                ..SearchParams::default()
            },
            max_results: 100,
            scoring,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NegotiationCounters {
    #[serde(default)]
    pub messages: u32,
    #[serde(default)]
    pub unread_messages: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NegotiationResume {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A response/invitation thread (`GET /negotiations`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Negotiation {
    pub id: String,
    pub state: IdName,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub resume: Option<NegotiationResume>,
    #[serde(default)]
    pub has_updates: bool,
    #[serde(default)]
    pub counters: Option<NegotiationCounters>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NegotiationPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Negotiation>,
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub pages: u32,
}

/// hh.ru timestamps look like "2024-03-01T12:30:00+0300"
pub fn parse_hh_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// "5 mo", "2 yr", "2 yr 3 mo"
pub fn format_experience(months: Option<u32>) -> String {
    let months = match months {
        Some(m) if m > 0 => m,
        _ => return "no experience".to_string(),
    };
    let years = months / 12;
    let rest = months % 12;
    match (years, rest) {
        (0, m) => format!("{} mo", m),
        (y, 0) => format!("{} yr", y),
        (y, m) => format!("{} yr {} mo", y, m),
    }
}

pub fn format_salary(salary: Option<&Salary>) -> String {
    let Some(salary) = salary else {
        return "not stated".to_string();
    };
    let currency = match salary.currency.as_deref() {
        None | Some("RUR") | Some("RUB") => "₽".to_string(),
        Some(other) => other.to_string(),
    };
    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);

    match (
        positive(salary.amount),
        positive(salary.from),
        positive(salary.to),
    ) {
        (Some(amount), _, _) => format!("{} {}", group_thousands(amount), currency),
        (None, Some(from), Some(to)) => format!(
            "{} - {} {}",
            group_thousands(from),
            group_thousands(to),
            currency
        ),
        (None, Some(from), None) => format!("from {} {}", group_thousands(from), currency),
        (None, None, Some(to)) => format!("up to {} {}", group_thousands(to), currency),
        (None, None, None) => "not stated".to_string(),
    }
}

/// 1234567 -> "1 234 567"
fn group_thousands(value: f64) -> String {
    let digits = (value.round() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
