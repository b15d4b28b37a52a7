use super::config::ScoringConfig;
use super::factors::parse_window;

/// Validate a scoring configuration before anything is scored.
/// Returns all validation errors at once (not just the first).
///
/// `prefix` is the config path of the section, e.g. "vacancies[0].scoring".
pub fn validate_scoring(prefix: &str, config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Zero and negative weights are rejected rather than guessed at
    let weights = [
        ("experience", config.experience.weight),
        ("skills", config.skills.weight),
        ("salary", config.salary.weight),
        ("education", config.education.weight),
        ("job_search_status", config.job_search_status.weight),
        ("bonus", config.bonus.weight),
    ];
    for (name, weight) in weights {
        if !weight.is_finite() {
            errors.push(format!("{}.{}.weight: must be a number", prefix, name));
        } else if weight <= 0.0 {
            errors.push(format!(
                "{}.{}.weight: must be positive, got {}",
                prefix, name, weight
            ));
        }
    }

    check_terms(&mut errors, prefix, "skills.required", &config.skills.required);
    check_terms(&mut errors, prefix, "skills.bonus", &config.skills.bonus);
    check_terms(&mut errors, prefix, "bonus.keywords", &config.bonus.keywords);

    if let Some(range) = config.salary.optimal {
        if !range.min.is_finite() || !range.max.is_finite() {
            errors.push(format!("{}.salary.optimal: bounds must be numbers", prefix));
        } else {
            if range.min < 0.0 {
                errors.push(format!(
                    "{}.salary.optimal.min: must be non-negative",
                    prefix
                ));
            }
            if range.min > range.max {
                errors.push(format!(
                    "{}.salary.optimal: min ({}) is greater than max ({})",
                    prefix, range.min, range.max
                ));
            }
        }
    }

    if let Some(ref currency) = config.salary.currency {
        if currency.trim().is_empty() {
            errors.push(format!("{}.salary.currency: must not be empty", prefix));
        }
    }

    let share = config.bonus.signal_share;
    if !(share.is_finite() && share > 0.0 && share <= 1.0) {
        errors.push(format!(
            "{}.bonus.signal_share: must be in (0, 1], got {}",
            prefix, share
        ));
    }

    if let Some(ref window) = config.bonus.fresh_within {
        if let Err(e) = parse_window(window) {
            errors.push(format!(
                "{}.bonus.fresh_within: invalid '{}' - {}",
                prefix, window, e
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_terms(errors: &mut Vec<String>, prefix: &str, field: &str, terms: &[String]) {
    for (i, term) in terms.iter().enumerate() {
        if term.trim().is_empty() {
            errors.push(format!("{}.{}[{}]: must not be empty", prefix, field, i));
        }
    }
}
