use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, LocalBoxStream, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SearchParams;
use crate::hh::{HhClient, Resume, ResumePage, ResumeSummary};
use crate::scoring::{score_candidate, sort_by_score, CandidateInput, ScoreResult, ScoringConfig};
use crate::store::Store;

/// Candidates are persisted in chunks of this size
pub const SAVE_CHUNK: usize = 10;

/// Anything that can serve pages of résumé search results
pub trait ResumeSource {
    fn fetch_page(
        &self,
        params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<ResumePage>>;
}

impl ResumeSource for HhClient {
    async fn fetch_page(
        &self,
        params: &SearchParams,
        page: u32,
        per_page: u32,
    ) -> Result<ResumePage> {
        self.search_resumes(params, page, per_page).await
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub params: SearchParams,
    pub max_results: usize,
    pub per_page: u32,
    pub page_delay: Duration,
}

impl BatchRequest {
    /// Pages needed to reach `max_results`
    pub fn max_pages(&self) -> u32 {
        let per_page = self.per_page.max(1) as usize;
        self.max_results.div_ceil(per_page) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Loading,
    Scoring,
    Saving,
    Done,
    Error,
}

/// Progress snapshot emitted by the loader
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub status: BatchStatus,
    pub page: u32,
    pub pages: u32,
    pub loaded: usize,
    pub total: u64,
    pub saved: usize,
    pub message: String,
    pub search_session_id: Option<Uuid>,
}

/// A résumé together with its score
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub summary: ResumeSummary,
    pub input: CandidateInput,
    pub resume_updated_at: Option<DateTime<Utc>>,
    pub result: ScoreResult,
}

impl ScoredCandidate {
    pub fn from_resume(resume: &Resume, scoring: &ScoringConfig, as_of: DateTime<Utc>) -> Self {
        let input = resume.to_candidate_input(as_of);
        let result = score_candidate(&input, scoring);
        Self {
            summary: resume.summary(),
            input,
            resume_updated_at: resume.updated_at(),
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    BeforePage(u32),
    FetchPage(u32),
    Scoring,
    Saving(usize),
    Done,
    Finished,
}

/// Pages through a résumé source, scores and ranks every résumé, and
/// optionally persists the results. Progress is exposed as a stream of
/// snapshots; `reset` makes the sequence replayable.
pub struct BatchLoader<'a, S: ResumeSource> {
    source: S,
    request: BatchRequest,
    scoring: ScoringConfig,
    sink: Option<(&'a mut Store, Uuid)>,
    phase: Phase,
    as_of: DateTime<Utc>,
    pages: u32,
    total: u64,
    resumes: Vec<Resume>,
    results: Vec<ScoredCandidate>,
    saved: usize,
    save_error: Option<String>,
    fetch_error: Option<anyhow::Error>,
    session_id: Option<Uuid>,
}

impl<'a, S: ResumeSource> BatchLoader<'a, S> {
    pub fn new(source: S, request: BatchRequest, scoring: ScoringConfig) -> Self {
        let pages = request.max_pages();
        Self {
            source,
            request,
            scoring,
            sink: None,
            phase: Phase::Start,
            as_of: Utc::now(),
            pages,
            total: 0,
            resumes: Vec::new(),
            results: Vec::new(),
            saved: 0,
            save_error: None,
            fetch_error: None,
            session_id: None,
        }
    }

    /// Persist results into `store` under the given vacancy
    pub fn with_store(mut self, store: &'a mut Store, vacancy_id: Uuid) -> Self {
        self.sink = Some((store, vacancy_id));
        self
    }

    /// Start over: the next `events()` call replays the whole sequence
    pub fn reset(&mut self) {
        self.phase = Phase::Start;
        self.as_of = Utc::now();
        self.pages = self.request.max_pages();
        self.total = 0;
        self.resumes.clear();
        self.results.clear();
        self.saved = 0;
        self.save_error = None;
        self.fetch_error = None;
        self.session_id = None;
    }

    /// The error that ended the sequence, if a page fetch failed
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.fetch_error.take()
    }

    /// Ranked results, best first. Empty until scoring has run.
    pub fn results(&self) -> &[ScoredCandidate] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ScoredCandidate> {
        self.results
    }

    /// Total matches reported by the source
    pub fn found(&self) -> u64 {
        self.total
    }

    pub fn search_session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Finite stream of progress snapshots, ending with `done` or `error`
    pub fn events(&mut self) -> LocalBoxStream<'_, BatchProgress> {
        stream::unfold(self, |loader| async move {
            let progress = loader.step().await?;
            Some((progress, loader))
        })
        .boxed_local()
    }

    fn progress(&self, status: BatchStatus, page: u32, message: String) -> BatchProgress {
        BatchProgress {
            status,
            page,
            pages: self.pages,
            loaded: self.resumes.len(),
            total: self.total,
            saved: self.saved,
            message,
            search_session_id: self.session_id,
        }
    }

    /// Advance one step. Returns None once the sequence has finished.
    pub async fn step(&mut self) -> Option<BatchProgress> {
        match self.phase {
            Phase::Start => {
                if let Some((store, vacancy_id)) = self.sink.as_mut() {
                    let id = store.state.start_session(*vacancy_id, &self.request.params);
                    self.session_id = Some(id);
                }
                tracing::info!(
                    text = %self.request.params.text,
                    max_results = self.request.max_results,
                    total_weight = self.scoring.total_weight(),
                    "starting résumé search"
                );
                self.phase = if self.pages == 0 {
                    Phase::Scoring
                } else {
                    Phase::BeforePage(0)
                };
                Some(self.progress(BatchStatus::Loading, 0, "Starting search".to_string()))
            }
            Phase::BeforePage(page) => {
                self.phase = Phase::FetchPage(page);
                Some(self.progress(
                    BatchStatus::Loading,
                    page + 1,
                    format!("Loading page {} of {}", page + 1, self.pages),
                ))
            }
            Phase::FetchPage(page) => Some(self.fetch(page).await),
            Phase::Scoring => {
                self.score_all();
                self.phase = if self.sink.is_some() && !self.results.is_empty() {
                    Phase::Saving(0)
                } else {
                    Phase::Done
                };
                Some(self.progress(
                    BatchStatus::Scoring,
                    self.pages,
                    format!("Scored {} candidates", self.results.len()),
                ))
            }
            Phase::Saving(from) => Some(self.save_chunk(from)),
            Phase::Done => {
                self.finish();
                self.phase = Phase::Finished;
                let message = match &self.save_error {
                    Some(e) => format!(
                        "Scored {} candidates (saving failed: {})",
                        self.results.len(),
                        e
                    ),
                    None => format!("Scored {} candidates", self.results.len()),
                };
                Some(self.progress(BatchStatus::Done, self.pages, message))
            }
            Phase::Finished => None,
        }
    }

    async fn fetch(&mut self, page: u32) -> BatchProgress {
        if page > 0 && !self.request.page_delay.is_zero() {
            tokio::time::sleep(self.request.page_delay).await;
        }

        let result = self
            .source
            .fetch_page(&self.request.params, page, self.request.per_page)
            .await;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(page, error = %format!("{:#}", e), "page fetch failed");
                self.phase = Phase::Finished;
                // Nothing was saved yet, so the session would stay open forever
                if let (Some((store, _)), Some(id)) = (self.sink.as_mut(), self.session_id.take()) {
                    store.state.discard_session(id);
                }
                let progress = self.progress(
                    BatchStatus::Error,
                    page + 1,
                    format!("Failed to load page {}: {:#}", page + 1, e),
                );
                self.fetch_error = Some(e);
                return progress;
            }
        };

        self.total = fetched.found;
        if fetched.pages > 0 {
            self.pages = self.pages.min(fetched.pages);
        }

        let page_empty = fetched.items.is_empty();
        let mut seen: HashSet<String> = self.resumes.iter().map(|r| r.id.clone()).collect();
        for resume in fetched.items {
            if self.resumes.len() >= self.request.max_results {
                break;
            }
            // Result pages can shift between requests; keep the first copy
            if seen.insert(resume.id.clone()) {
                self.resumes.push(resume);
            }
        }

        let next = page + 1;
        let finished = page_empty
            || self.resumes.len() >= self.request.max_results
            || next >= self.pages;
        self.phase = if finished {
            Phase::Scoring
        } else {
            Phase::BeforePage(next)
        };

        tracing::debug!(page = next, loaded = self.resumes.len(), "page loaded");
        self.progress(
            BatchStatus::Loading,
            next,
            format!("Loaded {} of {} résumés", self.resumes.len(), self.total),
        )
    }

    fn score_all(&mut self) {
        let mut results: Vec<ScoredCandidate> = self
            .resumes
            .iter()
            .map(|resume| ScoredCandidate::from_resume(resume, &self.scoring, self.as_of))
            .collect();
        sort_by_score(&mut results, |c| c.result.score);
        self.results = results;
    }

    fn save_chunk(&mut self, from: usize) -> BatchProgress {
        let to = (from + SAVE_CHUNK).min(self.results.len());
        let session_id = self.session_id;

        if let Some((store, vacancy_id)) = self.sink.as_mut() {
            for scored in &self.results[from..to] {
                store.state.upsert_candidate(scored);
                store.state.record_application(
                    &scored.summary.id,
                    *vacancy_id,
                    session_id,
                    scored.result.clone(),
                );
            }
            match store.save() {
                Ok(()) => self.saved = to,
                Err(e) => {
                    // Results are still shown; only persistence is lost
                    tracing::warn!(error = %format!("{:#}", e), "failed to save candidates");
                    self.save_error = Some(format!("{:#}", e));
                }
            }
        }

        self.phase = if self.save_error.is_some() || to >= self.results.len() {
            Phase::Done
        } else {
            Phase::Saving(to)
        };

        self.progress(
            BatchStatus::Saving,
            self.pages,
            format!("Saved {} of {} candidates", self.saved, self.results.len()),
        )
    }

    fn finish(&mut self) {
        let (Some((store, _)), Some(session_id)) = (self.sink.as_mut(), self.session_id) else {
            return;
        };
        let scores: Vec<u32> = self.results.iter().map(|c| c.result.score).collect();
        store.state.finish_session(session_id, self.total, &scores);

        if self.save_error.is_none() {
            if let Err(e) = store.save() {
                tracing::warn!(error = %format!("{:#}", e), "failed to save search session");
                self.save_error = Some(format!("{:#}", e));
            }
        }
    }
}
