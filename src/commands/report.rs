use anyhow::{Context as _, Result};
use std::path::Path;

use super::{stored_vacancy, Context};
use crate::export::{collect_rows, export_to_file, write_csv, ExportRow, ScoreRange};
use crate::output::{
    format_ranked_table, format_sessions, format_tsv, should_use_colors, RankedRow,
};
use crate::store::{CandidateStatus, StoreState};

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub vacancy: String,
    pub min_score: Option<u32>,
    pub max_score: Option<u32>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub tsv: bool,
}

/// Latest ranking for a vacancy, narrowed by score range and CRM status
fn list_rows<'a>(
    state: &'a StoreState,
    opts: &ListOptions,
) -> Result<Vec<ExportRow<'a>>> {
    let vacancy = stored_vacancy(state, &opts.vacancy)?;
    let range = ScoreRange::new(opts.min_score, opts.max_score)?;
    let status = opts
        .status
        .as_deref()
        .map(str::parse::<CandidateStatus>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let rows = collect_rows(state, vacancy.id, range)
        .into_iter()
        .filter(|row| status.map_or(true, |s| row.candidate.status == s))
        .take(opts.limit.unwrap_or(usize::MAX))
        .collect();
    Ok(rows)
}

pub fn run_list(ctx: &Context, opts: &ListOptions) -> Result<()> {
    let store = ctx.store()?;
    let rows = list_rows(&store.state, opts)?;

    let ranked: Vec<RankedRow> = rows
        .iter()
        .map(|row| RankedRow {
            summary: &row.candidate.summary,
            result: &row.application.result,
            status: Some(row.candidate.status),
        })
        .collect();

    if opts.tsv {
        let output = format_tsv(&ranked);
        if !output.is_empty() {
            println!("{}", output);
        }
    } else {
        println!("{}", format_ranked_table(&ranked, should_use_colors()));
    }
    Ok(())
}

pub fn run_sessions(ctx: &Context, vacancy: Option<&str>, limit: Option<usize>) -> Result<()> {
    let store = ctx.store()?;
    let state = &store.state;
    let vacancy_id = vacancy
        .map(|name| stored_vacancy(state, name).map(|v| v.id))
        .transpose()?;

    let sessions: Vec<_> = state
        .sessions_for(vacancy_id)
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|session| {
            let name = state
                .vacancy(session.vacancy_id)
                .map_or("?", |v| v.name.as_str());
            (session, name)
        })
        .collect();

    println!("{}", format_sessions(&sessions));
    Ok(())
}

/// Export a vacancy's ranking as CSV, to a file (with BOM) or stdout
pub fn run_export(
    ctx: &Context,
    vacancy: &str,
    out: Option<&Path>,
    min_score: Option<u32>,
    max_score: Option<u32>,
) -> Result<()> {
    let mut store = ctx.store()?;
    let vacancy_id = stored_vacancy(&store.state, vacancy)?.id;
    let range = ScoreRange::new(min_score, max_score)?;

    let (written, destination) = {
        let rows = collect_rows(&store.state, vacancy_id, range);
        match out {
            Some(path) => (export_to_file(path, &rows)?, path.display().to_string()),
            None => {
                let stdout = std::io::stdout();
                (write_csv(stdout.lock(), &rows)?, "stdout".to_string())
            }
        }
    };

    store
        .state
        .record_export(Some(vacancy_id), &destination, written);
    store.save().context("Failed to record export")?;

    tracing::info!(rows = written, destination = %destination, "export written");
    if out.is_some() {
        eprintln!("Exported {} candidate(s) to {}", written, destination);
    }
    Ok(())
}
