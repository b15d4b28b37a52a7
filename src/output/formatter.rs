use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::batch::{BatchProgress, BatchStatus};
use crate::hh::{Negotiation, ResumeSummary};
use crate::scoring::{Rating, ScoreResult};
use crate::store::{
    Activity, Application, CandidateRecord, CandidateStatus, Invitation, SearchSession,
};

/// One line of a ranked candidate table
pub struct RankedRow<'a> {
    pub summary: &'a ResumeSummary,
    pub result: &'a ScoreResult,
    pub status: Option<CandidateStatus>,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Pad to a display width counted in chars, not bytes
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// "★★★☆☆"
pub fn format_stars(stars: u8) -> String {
    let filled = stars.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn format_rating(rating: Rating, use_colors: bool) -> String {
    let label = rating.as_str();
    if !use_colors {
        return label.to_string();
    }
    match rating {
        Rating::Excellent => label.green().bold().to_string(),
        Rating::Good => label.cyan().to_string(),
        Rating::Average => label.yellow().to_string(),
        Rating::Weak => label.red().to_string(),
    }
}

/// Format candidates as a ranked table:
/// Index, Score, Stars, Name, Title, City, Salary (and CRM status when known)
pub fn format_ranked_table(rows: &[RankedRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No candidates found.".to_string();
    }

    let term_width = get_terminal_width();
    let name_width = 24;
    let separator = "  ";

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>3}.", idx + 1);
            let score_str = format!("{:>3}", row.result.score);
            let stars = format_stars(row.result.stars);
            let name = pad(&truncate(&row.summary.full_name, name_width), name_width);
            let status = row
                .status
                .map(|s| format!("{}[{}]", separator, s))
                .unwrap_or_default();
            let tail = format!(
                "{}{}{}{}",
                row.summary.city, separator, row.summary.salary, status
            );

            // index + score + stars + name + separators + tail
            let fixed_width = 4 + 1 + 3 + 5 + name_width + separator.len() * 4 + tail.chars().count();
            let title = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate(&row.summary.title, width - fixed_width)
                }
                Some(_) => truncate(&row.summary.title, 20),
                None => row.summary.title.clone(),
            };

            if use_colors {
                let score = match row.result.rating {
                    Rating::Excellent => score_str.green().bold().to_string(),
                    Rating::Good => score_str.cyan().bold().to_string(),
                    Rating::Average => score_str.yellow().to_string(),
                    Rating::Weak => score_str.red().to_string(),
                };
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score,
                    separator,
                    stars.yellow(),
                    separator,
                    name.bold(),
                    separator,
                    title,
                    separator,
                    tail.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str,
                    score_str,
                    separator,
                    stars,
                    separator,
                    name,
                    separator,
                    title,
                    separator,
                    tail
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format candidates as tab-separated values for scripting
/// Columns: score, rating, résumé id, name, title, url (no headers, no colors)
pub fn format_tsv(rows: &[RankedRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.result.score,
                row.result.rating,
                row.summary.id,
                row.summary.full_name,
                row.summary.title,
                row.summary.resume_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-factor audit trail of a score
pub fn format_score_detail(result: &ScoreResult, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let headline = format!(
        "Score: {}/100  {}  {}",
        result.score,
        format_stars(result.stars),
        format_rating(result.rating, use_colors)
    );
    lines.push(if use_colors {
        headline.bold().to_string()
    } else {
        headline
    });

    for factor in &result.factors {
        lines.push(format!(
            "  {} {:>3} / {:<3}  {}",
            pad(&factor.label, 18),
            factor.points,
            factor.weight.round() as i64,
            factor.description
        ));
    }
    lines.join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Full candidate card: contacts, CRM state, score history and activity
pub fn format_candidate_card(
    candidate: &CandidateRecord,
    applications: &[(&Application, Option<&str>)],
    invitations: &[&Invitation],
    activities: &[&Activity],
    use_colors: bool,
) -> String {
    let summary = &candidate.summary;
    let mut lines = Vec::new();

    let heading = format!("{} ({})", summary.full_name, summary.id);
    lines.push(if use_colors {
        heading.bold().to_string()
    } else {
        heading
    });
    lines.push(format!("  Title: {}", summary.title));
    if let Some(age) = summary.age {
        lines.push(format!("  Age: {}", age));
    }
    lines.push(format!("  City: {}", summary.city));
    lines.push(format!("  Salary: {}", summary.salary));
    lines.push(format!("  Experience: {}", summary.experience));
    if !summary.skills.is_empty() {
        lines.push(format!("  Skills: {}", summary.skills.join(", ")));
    }
    if let Some(updated) = summary.updated_at {
        lines.push(format!(
            "  Updated: {} ({} ago)",
            updated.format("%Y-%m-%d"),
            format_age(Utc::now() - updated)
        ));
    }
    if let Some(email) = &summary.email {
        lines.push(format!("  Email: {}", email));
    }
    if let Some(phone) = &summary.phone {
        lines.push(format!("  Phone: {}", phone));
    }
    if !summary.resume_url.is_empty() {
        let url = if use_colors {
            summary.resume_url.underline().to_string()
        } else {
            summary.resume_url.clone()
        };
        lines.push(format!("  URL: {}", url));
    }

    lines.push(format!("  Status: {}", candidate.status));
    if !candidate.tags.is_empty() {
        lines.push(format!("  Tags: {}", candidate.tags.join(", ")));
    }

    if let Some((latest, vacancy)) = applications.first() {
        lines.push(String::new());
        lines.push(format!(
            "Latest score{}:",
            vacancy.map(|v| format!(" for {}", v)).unwrap_or_default()
        ));
        lines.push(format_score_detail(&latest.result, use_colors));
    }

    if applications.len() > 1 {
        lines.push(String::new());
        lines.push("Score history:".to_string());
        for (app, vacancy) in applications {
            lines.push(format!(
                "  {}  {:>3}  {}",
                format_timestamp(app.created_at),
                app.result.score,
                vacancy.unwrap_or("-")
            ));
        }
    }

    if !candidate.notes.is_empty() {
        lines.push(String::new());
        lines.push("Notes:".to_string());
        for note in &candidate.notes {
            lines.push(format!("  {}  {}", format_timestamp(note.at), note.text));
        }
    }

    if !invitations.is_empty() {
        lines.push(String::new());
        lines.push("Invitations:".to_string());
        for invitation in invitations {
            let error = invitation
                .error
                .as_ref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default();
            lines.push(format!(
                "  {}  {}{}",
                format_timestamp(invitation.created_at),
                invitation.status,
                error
            ));
        }
    }

    if !activities.is_empty() {
        lines.push(String::new());
        lines.push("Activity:".to_string());
        for activity in activities {
            lines.push(format!(
                "  {}  {}",
                format_timestamp(activity.at),
                activity.description
            ));
        }
    }

    lines.join("\n")
}

/// One line per search session, newest first
pub fn format_sessions(sessions: &[(&SearchSession, &str)]) -> String {
    if sessions.is_empty() {
        return "No search sessions yet.".to_string();
    }

    sessions
        .iter()
        .map(|(session, vacancy)| {
            let stats = match (session.avg_score, session.min_score, session.max_score) {
                (Some(avg), Some(min), Some(max)) => {
                    format!("avg {:.1}, min {}, max {}", avg, min, max)
                }
                _ => "no scores".to_string(),
            };
            let state = if session.finished_at.is_some() {
                ""
            } else {
                "  (unfinished)"
            };
            format!(
                "{}  {}  \"{}\"  found {}, scored {}  {}{}",
                format_timestamp(session.started_at),
                vacancy,
                session.params.text,
                session.total_found,
                session.total_scored,
                stats,
                state
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line for batch progress, written to stderr while a search runs
pub fn format_progress(progress: &BatchProgress) -> String {
    let status = match progress.status {
        BatchStatus::Loading => "loading",
        BatchStatus::Scoring => "scoring",
        BatchStatus::Saving => "saving",
        BatchStatus::Done => "done",
        BatchStatus::Error => "error",
    };
    format!("[{:<7}] {}", status, progress.message)
}

pub fn format_negotiations(negotiations: &[Negotiation], use_colors: bool) -> String {
    if negotiations.is_empty() {
        return "No negotiations found.".to_string();
    }

    negotiations
        .iter()
        .map(|n| {
            let resume = n
                .resume
                .as_ref()
                .map(|r| format!("{} {}", r.id, r.title.as_deref().unwrap_or("")))
                .unwrap_or_else(|| "-".to_string());
            let unread = n
                .counters
                .as_ref()
                .map(|c| c.unread_messages)
                .unwrap_or(0);
            let marker = if n.has_updates || unread > 0 { "*" } else { " " };
            let state = n.state.name.as_deref().unwrap_or(&n.state.id);
            let line = format!("{} {}  {}  {}", marker, n.id, pad(state, 14), resume.trim());
            if use_colors && marker == "*" {
                line.bold().to_string()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{score_candidate, CandidateInput, ScoringConfig};

    fn sample_summary() -> ResumeSummary {
        ResumeSummary {
            id: "abc123".to_string(),
            full_name: "Petrov Ivan".to_string(),
            title: "Senior Go developer".to_string(),
            city: "Moscow".to_string(),
            salary: "250 000 ₽".to_string(),
            experience: "6 yr 8 mo".to_string(),
            resume_url: "https://hh.ru/resume/abc123".to_string(),
            ..ResumeSummary::default()
        }
    }

    fn sample_result() -> ScoreResult {
        let input = CandidateInput {
            experience_months: Some(24),
            ..CandidateInput::default()
        };
        score_candidate(&input, &ScoringConfig::default())
    }

    #[test]
    fn test_format_stars() {
        assert_eq!(format_stars(0), "☆☆☆☆☆");
        assert_eq!(format_stars(3), "★★★☆☆");
        assert_eq!(format_stars(5), "★★★★★");
        assert_eq!(format_stars(9), "★★★★★");
    }

    #[test]
    fn test_ranked_table_empty() {
        assert_eq!(format_ranked_table(&[], false), "No candidates found.");
    }

    #[test]
    fn test_ranked_table_row() {
        let summary = sample_summary();
        let result = sample_result();
        let rows = vec![RankedRow {
            summary: &summary,
            result: &result,
            status: Some(CandidateStatus::Contacted),
        }];
        let table = format_ranked_table(&rows, false);
        assert!(table.starts_with("  1."));
        assert!(table.contains("Petrov Ivan"));
        assert!(table.contains("Moscow"));
        assert!(table.contains("[contacted]"));
        assert!(table.contains(&format_stars(result.stars)));
    }

    #[test]
    fn test_tsv() {
        let summary = sample_summary();
        let result = sample_result();
        let rows = vec![RankedRow {
            summary: &summary,
            result: &result,
            status: None,
        }];
        let tsv = format_tsv(&rows);
        let fields: Vec<&str> = tsv.split('\t').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], result.score.to_string());
        assert_eq!(fields[2], "abc123");
        assert_eq!(fields[5], "https://hh.ru/resume/abc123");
    }

    #[test]
    fn test_score_detail_lists_factors() {
        let result = sample_result();
        let detail = format_score_detail(&result, false);
        assert!(detail.starts_with(&format!("Score: {}/100", result.score)));
        assert_eq!(detail.lines().count(), 1 + result.factors.len());
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("Разработчик", 20), "Разработчик");
        assert_eq!(truncate("Разработчик", 6), "Раз...");
        assert_eq!(pad("Иван", 6).chars().count(), 6);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::hours(3)), "3h");
        assert_eq!(format_age(Duration::days(2)), "2d");
        assert_eq!(format_age(Duration::weeks(2)), "2w");
        assert_eq!(format_age(Duration::minutes(30)), "30m");
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }

    #[test]
    fn test_format_progress() {
        let progress = BatchProgress {
            status: BatchStatus::Loading,
            page: 1,
            pages: 5,
            loaded: 0,
            total: 0,
            saved: 0,
            message: "Loading page 1 of 5".to_string(),
            search_session_id: None,
        };
        assert_eq!(format_progress(&progress), "[loading] Loading page 1 of 5");
    }
}
