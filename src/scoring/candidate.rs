use serde::{Deserialize, Serialize};

/// The attributes of a résumé the scoring engine looks at.
///
/// Every field is optional. Missing data lowers (or neutralizes) the matching
/// factor but never makes scoring fail.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CandidateInput {
    /// Total work experience in months. `Some(0)` is treated like `None`.
    #[serde(default)]
    pub experience_months: Option<u32>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub salary: Option<SalaryExpectation>,

    /// hh.ru education level id ("higher", "secondary", ...) or free text
    #[serde(default)]
    pub education: Option<String>,

    /// hh.ru job search status id ("active_search", ...) or free text
    #[serde(default)]
    pub job_search_status: Option<String>,

    /// Title, about-me and experience descriptions, used for keyword signals
    #[serde(default)]
    pub free_text: Vec<String>,

    /// Days between the last résumé update and the time the input was built
    #[serde(default)]
    pub days_since_update: Option<i64>,
}

/// What the candidate asks for: a fixed amount or a from/to range.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SalaryExpectation {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl SalaryExpectation {
    pub fn fixed(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    /// The single figure used for scoring: the fixed amount, else the range
    /// midpoint, else whichever bound is given. Non-positive values are ignored.
    pub fn expected_amount(&self) -> Option<f64> {
        let positive = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);

        if let Some(amount) = positive(self.amount) {
            return Some(amount);
        }
        match (positive(self.from), positive(self.to)) {
            (Some(from), Some(to)) => Some((from + to) / 2.0),
            (Some(from), None) => Some(from),
            (None, Some(to)) => Some(to),
            (None, None) => None,
        }
    }
}
