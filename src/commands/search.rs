use anyhow::{Context as _, Result};
use chrono::Utc;
use futures::StreamExt;
use std::io::IsTerminal;

use super::{find_vacancy, stored_vacancy, Context};
use crate::batch::{BatchLoader, BatchRequest, ScoredCandidate};
use crate::config::VacancyConfig;
use crate::credentials::reprompt_for_token;
use crate::hh::{ApiError, HhClient};
use crate::output::{format_progress, format_ranked_table, format_tsv, should_use_colors, RankedRow};
use crate::scoring::{score_candidate, sort_by_score};
use crate::store::{CandidateStatus, Store, StoreState};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub vacancy: String,
    pub max_results: Option<usize>,
    pub limit: Option<usize>,
    pub tsv: bool,
    pub no_save: bool,
}

struct BatchOutcome {
    found: u64,
    results: Vec<ScoredCandidate>,
}

fn is_unauthorized(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)))
}

async fn run_batch(
    client: HhClient,
    request: &BatchRequest,
    vacancy: &VacancyConfig,
    store: Option<&mut Store>,
) -> Result<BatchOutcome> {
    let loader = BatchLoader::new(client, request.clone(), vacancy.scoring.clone());
    let mut loader = match store {
        Some(store) => {
            let vacancy_id = store.state.upsert_vacancy(vacancy);
            loader.with_store(store, vacancy_id)
        }
        None => loader,
    };

    let show_progress = std::io::stderr().is_terminal();
    {
        let mut events = loader.events();
        while let Some(progress) = events.next().await {
            tracing::debug!(status = ?progress.status, loaded = progress.loaded, "{}", progress.message);
            if show_progress {
                eprintln!("{}", format_progress(&progress));
            }
        }
    }

    if let Some(e) = loader.take_error() {
        return Err(e.context("Résumé search failed"));
    }

    Ok(BatchOutcome {
        found: loader.found(),
        results: loader.into_results(),
    })
}

fn print_ranked(rows: &[RankedRow], tsv: bool) {
    if tsv {
        let output = format_tsv(rows);
        if !output.is_empty() {
            println!("{}", output);
        }
    } else {
        println!("{}", format_ranked_table(rows, should_use_colors()));
    }
}

fn status_of(state: Option<&StoreState>, candidate_id: &str) -> Option<CandidateStatus> {
    state
        .and_then(|s| s.candidates.get(candidate_id))
        .map(|c| c.status)
}

/// Search hh.ru for a vacancy, score every résumé and show the ranking
pub async fn run_search(ctx: &Context, opts: &SearchOptions) -> Result<()> {
    let config = ctx.config()?;
    let vacancy = find_vacancy(&config, &opts.vacancy)?.clone();
    let request = BatchRequest {
        params: vacancy.search.clone(),
        max_results: opts.max_results.unwrap_or(vacancy.max_results),
        per_page: config.api.per_page,
        page_delay: config.api.request_delay()?,
    };

    let mut client = ctx.client(&config).await?;
    let mut store = if opts.no_save {
        None
    } else {
        Some(ctx.store()?)
    };

    let mut reprompted = false;
    let outcome = loop {
        match run_batch(client.clone(), &request, &vacancy, store.as_mut()).await {
            Err(e) if !reprompted && is_unauthorized(&e) && std::io::stdin().is_terminal() => {
                let token = reprompt_for_token().await?;
                client = ctx.client_with_token(&config, &token)?;
                reprompted = true;
            }
            other => break other?,
        }
    };

    let state = store.as_ref().map(|s| &s.state);
    let shown = opts.limit.unwrap_or(outcome.results.len());
    let rows: Vec<RankedRow> = outcome
        .results
        .iter()
        .take(shown)
        .map(|c| RankedRow {
            summary: &c.summary,
            result: &c.result,
            status: status_of(state, &c.summary.id),
        })
        .collect();
    print_ranked(&rows, opts.tsv);

    if !opts.tsv {
        eprintln!();
        eprintln!(
            "Scored {} of {} résumés found for '{}'",
            outcome.results.len(),
            outcome.found,
            vacancy.name
        );
    }
    Ok(())
}

/// Re-score stored candidates against the vacancy's current profile.
/// Each candidate gets a new application snapshot; old ones are kept.
pub fn run_rescore(ctx: &Context, vacancy_name: &str, tsv: bool) -> Result<()> {
    let config = ctx.config()?;
    let vacancy = find_vacancy(&config, vacancy_name)?;
    let mut store = ctx.store()?;

    let previous = stored_vacancy(&store.state, vacancy_name)?.id;
    let candidate_ids: Vec<String> = store
        .state
        .latest_applications(previous)
        .iter()
        .map(|a| a.candidate_id.clone())
        .collect();
    let vacancy_id = store.state.upsert_vacancy(vacancy);

    let now = Utc::now();
    let mut rescored = Vec::with_capacity(candidate_ids.len());
    for id in candidate_ids {
        let Some(candidate) = store.state.candidates.get(&id) else {
            continue;
        };
        let result = score_candidate(&candidate.input_as_of(now), &vacancy.scoring);
        store
            .state
            .record_application(&id, vacancy_id, None, result.clone());
        rescored.push((id, result));
    }
    store.save().context("Failed to save re-scored candidates")?;
    tracing::info!(count = rescored.len(), vacancy = %vacancy.name, "candidates re-scored");

    sort_by_score(&mut rescored, |(_, result)| result.score);
    let rows: Vec<RankedRow> = rescored
        .iter()
        .filter_map(|(id, result)| {
            let candidate = store.state.candidates.get(id)?;
            Some(RankedRow {
                summary: &candidate.summary,
                result,
                status: Some(candidate.status),
            })
        })
        .collect();
    print_ranked(&rows, tsv);
    Ok(())
}
