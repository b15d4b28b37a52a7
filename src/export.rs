use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

use crate::scoring::MAX_SCORE;
use crate::store::{Application, CandidateRecord, StoreState};

/// Spreadsheet apps need the BOM to detect UTF-8 (Cyrillic names)
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADERS: [&str; 15] = [
    "ID",
    "Full name",
    "Title",
    "Age",
    "City",
    "Salary",
    "Experience",
    "Skills",
    "Score",
    "Rating",
    "Stars",
    "Updated",
    "Email",
    "Phone",
    "URL",
];

/// Inclusive score filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_SCORE,
        }
    }
}

impl ScoreRange {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Result<Self> {
        let range = Self {
            min: min.unwrap_or(0),
            max: max.unwrap_or(MAX_SCORE),
        };
        if range.max > MAX_SCORE {
            anyhow::bail!("Maximum score must be at most {}", MAX_SCORE);
        }
        if range.min > range.max {
            anyhow::bail!(
                "Minimum score ({}) is greater than maximum ({})",
                range.min,
                range.max
            );
        }
        Ok(range)
    }

    pub fn contains(&self, score: u32) -> bool {
        self.min <= score && score <= self.max
    }
}

/// One exported line: the newest application joined with its candidate
pub struct ExportRow<'a> {
    pub application: &'a Application,
    pub candidate: &'a CandidateRecord,
}

/// Ranked rows for a vacancy whose latest score falls in `range`
pub fn collect_rows(state: &StoreState, vacancy_id: Uuid, range: ScoreRange) -> Vec<ExportRow<'_>> {
    state
        .latest_applications(vacancy_id)
        .into_iter()
        .filter(|app| range.contains(app.result.score))
        .filter_map(|application| {
            let candidate = state.candidates.get(&application.candidate_id)?;
            Some(ExportRow {
                application,
                candidate,
            })
        })
        .collect()
}

/// Write rows as CSV. Returns the number of data rows written.
pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow<'_>]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(HEADERS)
        .context("Failed to write CSV header")?;

    for row in rows {
        let summary = &row.candidate.summary;
        let result = &row.application.result;
        let record = [
            summary.id.clone(),
            summary.full_name.clone(),
            summary.title.clone(),
            summary.age.map(|a| a.to_string()).unwrap_or_default(),
            summary.city.clone(),
            summary.salary.clone(),
            summary.experience.clone(),
            summary.skills.join("; "),
            result.score.to_string(),
            result.rating.to_string(),
            result.stars.to_string(),
            summary
                .updated_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            summary.email.clone().unwrap_or_default(),
            summary.phone.clone().unwrap_or_default(),
            summary.resume_url.clone(),
        ];
        csv_writer
            .write_record(&record)
            .with_context(|| format!("Failed to write CSV row for {}", summary.id))?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(rows.len())
}

/// Write rows to a CSV file prefixed with a UTF-8 BOM
pub fn export_to_file(path: &Path, rows: &[ExportRow<'_>]) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file at {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(UTF8_BOM)
        .context("Failed to write export file")?;
    let written = write_csv(&mut writer, rows)?;
    writer.flush().context("Failed to write export file")?;
    Ok(written)
}
