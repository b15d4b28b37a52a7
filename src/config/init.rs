use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, ApiConfig, Config, SearchParams, VacancyConfig};
use crate::scoring::{validate_scoring, ExperienceLevel, SalaryRange, ScoringConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

/// "Go, PostgreSQL ,  Kafka" -> ["Go", "PostgreSQL", "Kafka"]
fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_weight(input: &str) -> Result<f64, String> {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        Ok(_) => Err("must be a positive number".to_string()),
        Err(_) => Err("not a number".to_string()),
    }
}

/// Empty input means "no bound"
fn parse_amount(input: &str) -> Result<Option<f64>, String> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err("must be a non-negative number".to_string()),
    }
}

fn prompt_weight(label: &str, default: f64) -> Result<f64> {
    loop {
        let input = prompt_with_default(&format!("  {} weight", label), &default.to_string())?;
        match parse_weight(&input) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

fn prompt_amount(message: &str) -> Result<Option<f64>> {
    loop {
        let input = prompt(message)?;
        match parse_amount(&input) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Warn when the weights add up past the 100-point cap
fn capped_weight_note(scoring: &ScoringConfig) -> Option<String> {
    let total = scoring.total_weight();
    (total > 100.0).then(|| {
        format!(
            "Total weight is {}; scores above 100 will be capped.",
            total
        )
    })
}

/// Interactive questions for one vacancy profile
fn prompt_vacancy() -> Result<VacancyConfig> {
    let name = loop {
        let n = prompt("Vacancy name (e.g. backend-go): ")?;
        if !n.is_empty() {
            break n;
        }
        println!("  Vacancy name is required.");
    };

    println!();
    typewriter("The search text is sent to hh.ru as-is, so its query language works here too.");
    let text = loop {
        let t = prompt("Search text: ")?;
        if !t.is_empty() {
            break t;
        }
        println!("  Search text is required.");
    };
    let area = prompt("hh.ru area id (1 = Moscow, 2 = Saint Petersburg, empty = anywhere): ")?;

    let mut scoring = ScoringConfig::default();

    println!();
    typewriter("Required experience: noExperience, between1And3, between3And6, moreThan6.");
    scoring.experience.required_level = loop {
        let input = prompt_with_default(
            "Required experience",
            scoring.experience.required_level.as_str(),
        )?;
        match ExperienceLevel::parse(&input) {
            Ok(level) => break level,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    println!();
    typewriter("Skills are matched case-insensitively. Separate them with commas.");
    scoring.skills.required = parse_list(&prompt("Required skills: ")?);
    scoring.skills.bonus = parse_list(&prompt("Nice-to-have skills: ")?);

    println!();
    typewriter("Salary expectations inside this band get full salary points. Leave empty to skip.");
    let min = prompt_amount("Salary from: ")?;
    let max = prompt_amount("Salary to: ")?;
    scoring.salary.optimal = match (min, max) {
        (Some(min), Some(max)) if min <= max => Some(SalaryRange { min, max }),
        (Some(min), Some(max)) => {
            println!("  Swapping bounds: {} > {}", min, max);
            Some(SalaryRange { min: max, max: min })
        }
        (Some(min), None) => Some(SalaryRange { min, max: min }),
        (None, Some(max)) => Some(SalaryRange { min: 0.0, max }),
        (None, None) => None,
    };
    if scoring.salary.optimal.is_some() {
        scoring.salary.currency = Some(prompt_with_default("Currency", "RUR")?);
    }

    println!();
    let custom_weights = prompt_yes_no("Adjust factor weights? (n keeps 30/25/15/10/10/10)", false)?;
    if custom_weights {
        typewriter("Weights are relative. They don't need to add up to 100; the total is capped at 100.");
        scoring.experience.weight = prompt_weight("Experience", scoring.experience.weight)?;
        scoring.skills.weight = prompt_weight("Skills", scoring.skills.weight)?;
        scoring.salary.weight = prompt_weight("Salary", scoring.salary.weight)?;
        scoring.education.weight = prompt_weight("Education", scoring.education.weight)?;
        scoring.job_search_status.weight =
            prompt_weight("Job search status", scoring.job_search_status.weight)?;
        scoring.bonus.weight = prompt_weight("Bonus", scoring.bonus.weight)?;
        if let Some(note) = capped_weight_note(&scoring) {
            println!("  {}", note);
        }
    }

    Ok(VacancyConfig {
        name,
        hh_vacancy_id: None,
        invite_message: None,
        search: SearchParams {
            text,
            area: Some(area).filter(|a| !a.is_empty()),
            ..SearchParams::default()
        },
        max_results: 100,
        scoring,
    })
}

/// Serialize and write a config file, creating parent directories
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, &yaml)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("hh-scout Configuration Wizard");
    println!("=============================");
    println!();
    typewriter("A vacancy profile says what to search for on hh.ru and how to score what comes back.");
    println!();

    let mut vacancies: Vec<VacancyConfig> = Vec::new();
    loop {
        let vacancy = prompt_vacancy()?;
        if let Err(errors) = validate_scoring(&format!("{}.scoring", vacancy.name), &vacancy.scoring)
        {
            for error in errors {
                println!("  {}", error);
            }
            println!("  Let's try that vacancy again.");
            continue;
        }
        vacancies.push(vacancy);

        let add_another = prompt_yes_no("Add another vacancy?", false)?;
        if !add_another {
            break;
        }
        println!();
    }

    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = Config {
        api: ApiConfig::default(),
        log_level: None,
        vacancies,
    };
    write_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    typewriter("Set hh_vacancy_id on a vacancy to send invitations, or use `hh-scout import-vacancy` to build one from a published vacancy.");
    println!("Run `hh-scout search <vacancy>` to get started.");

    Ok(())
}
