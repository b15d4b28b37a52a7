use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::crm::{CandidateStatus, InvitationStatus};
use crate::batch::ScoredCandidate;
use crate::config::{SearchParams, VacancyConfig};
use crate::hh::ResumeSummary;
use crate::scoring::{sort_by_score, CandidateInput, ScoreResult, ScoringConfig};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub vacancies: Vec<VacancyRecord>,
    /// Keyed by hh.ru résumé id
    #[serde(default)]
    pub candidates: BTreeMap<String, CandidateRecord>,
    #[serde(default)]
    pub sessions: Vec<SearchSession>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub exports: Vec<ExportRecord>,
}

/// Snapshot of a vacancy profile as it was last used for scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub hh_vacancy_id: Option<String>,
    pub scoring: ScoringConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub summary: ResumeSummary,
    /// Scoring input as of the last fetch, kept for re-scoring offline
    pub input: CandidateInput,
    #[serde(default)]
    pub resume_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CandidateStatus,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl CandidateRecord {
    /// Scoring input with freshness recomputed against `as_of`
    pub fn input_as_of(&self, as_of: DateTime<Utc>) -> CandidateInput {
        let mut input = self.input.clone();
        input.days_since_update = self
            .resume_updated_at
            .map(|updated| (as_of - updated).num_days());
        input
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSession {
    pub id: Uuid,
    pub vacancy_id: Uuid,
    pub params: SearchParams,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_found: u64,
    #[serde(default)]
    pub total_scored: usize,
    #[serde(default)]
    pub avg_score: Option<f64>,
    #[serde(default)]
    pub min_score: Option<u32>,
    #[serde(default)]
    pub max_score: Option<u32>,
}

/// Immutable score snapshot of one candidate against one vacancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: String,
    pub vacancy_id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub result: ScoreResult,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub candidate_id: String,
    pub vacancy_id: Uuid,
    #[serde(default)]
    pub hh_invitation_id: Option<String>,
    pub message: String,
    pub status: InvitationStatus,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StatusChanged,
    Note,
    Invitation,
    Message,
    Export,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub candidate_id: Option<String>,
    pub kind: ActivityKind,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: Uuid,
    #[serde(default)]
    pub vacancy_id: Option<Uuid>,
    pub path: String,
    pub rows: usize,
    pub created_at: DateTime<Utc>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreState {
    /// Create a new empty store with the current version
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            vacancies: Vec::new(),
            candidates: BTreeMap::new(),
            sessions: Vec::new(),
            applications: Vec::new(),
            invitations: Vec::new(),
            activities: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn vacancy_by_name(&self, name: &str) -> Option<&VacancyRecord> {
        self.vacancies
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn vacancy(&self, id: Uuid) -> Option<&VacancyRecord> {
        self.vacancies.iter().find(|v| v.id == id)
    }

    /// Insert or refresh a vacancy snapshot by name. Returns its id.
    pub fn upsert_vacancy(&mut self, config: &VacancyConfig) -> Uuid {
        let now = Utc::now();
        if let Some(existing) = self
            .vacancies
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(config.name.trim()))
        {
            existing.hh_vacancy_id = config.hh_vacancy_id.clone();
            existing.scoring = config.scoring.clone();
            existing.updated_at = now;
            return existing.id;
        }

        let id = Uuid::new_v4();
        self.vacancies.push(VacancyRecord {
            id,
            name: config.name.trim().to_string(),
            hh_vacancy_id: config.hh_vacancy_id.clone(),
            scoring: config.scoring.clone(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Insert or refresh a candidate by résumé id. CRM fields survive refreshes.
    /// Returns true when the candidate is new.
    pub fn upsert_candidate(&mut self, scored: &ScoredCandidate) -> bool {
        let now = Utc::now();
        match self.candidates.get_mut(&scored.summary.id) {
            Some(existing) => {
                existing.summary = scored.summary.clone();
                existing.input = scored.input.clone();
                existing.resume_updated_at = scored.resume_updated_at;
                existing.last_seen = now;
                false
            }
            None => {
                self.candidates.insert(
                    scored.summary.id.clone(),
                    CandidateRecord {
                        id: scored.summary.id.clone(),
                        summary: scored.summary.clone(),
                        input: scored.input.clone(),
                        resume_updated_at: scored.resume_updated_at,
                        status: CandidateStatus::New,
                        notes: Vec::new(),
                        tags: Vec::new(),
                        first_seen: now,
                        last_seen: now,
                    },
                );
                true
            }
        }
    }

    /// Resolve a candidate by exact résumé id, then by unique id prefix,
    /// then by unique case-insensitive name match.
    pub fn find_candidate(&self, query: &str) -> Result<&CandidateRecord> {
        let query = query.trim();
        if let Some(found) = self.candidates.get(query) {
            return Ok(found);
        }

        let lowered = query.to_lowercase();
        let by_prefix: Vec<&CandidateRecord> = self
            .candidates
            .values()
            .filter(|c| c.id.starts_with(query))
            .collect();
        let matches = if by_prefix.is_empty() {
            self.candidates
                .values()
                .filter(|c| c.summary.full_name.to_lowercase().contains(&lowered))
                .collect()
        } else {
            by_prefix
        };

        match matches.as_slice() {
            [] => anyhow::bail!("No candidate matches '{}'", query),
            [only] => Ok(only),
            many => anyhow::bail!(
                "'{}' matches {} candidates; use the résumé id",
                query,
                many.len()
            ),
        }
    }

    pub fn start_session(&mut self, vacancy_id: Uuid, params: &SearchParams) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.push(SearchSession {
            id,
            vacancy_id,
            params: params.clone(),
            started_at: Utc::now(),
            finished_at: None,
            total_found: 0,
            total_scored: 0,
            avg_score: None,
            min_score: None,
            max_score: None,
        });
        id
    }

    /// Close a session with totals and score statistics
    pub fn finish_session(&mut self, id: Uuid, total_found: u64, scores: &[u32]) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) else {
            return;
        };
        session.finished_at = Some(Utc::now());
        session.total_found = total_found;
        session.total_scored = scores.len();
        session.min_score = scores.iter().copied().min();
        session.max_score = scores.iter().copied().max();
        session.avg_score = if scores.is_empty() {
            None
        } else {
            let sum: u64 = scores.iter().map(|s| u64::from(*s)).sum();
            Some(sum as f64 / scores.len() as f64)
        };
    }

    /// Remove a session that never finished. Finished sessions are kept.
    /// Returns true when a session was removed.
    pub fn discard_session(&mut self, id: Uuid) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id || s.finished_at.is_some());
        self.sessions.len() != before
    }

    /// Newest sessions first, optionally for one vacancy
    pub fn sessions_for(&self, vacancy_id: Option<Uuid>) -> Vec<&SearchSession> {
        let mut sessions: Vec<&SearchSession> = self
            .sessions
            .iter()
            .filter(|s| vacancy_id.map_or(true, |id| s.vacancy_id == id))
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions
    }

    /// Append an immutable score snapshot
    pub fn record_application(
        &mut self,
        candidate_id: &str,
        vacancy_id: Uuid,
        session_id: Option<Uuid>,
        result: ScoreResult,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.applications.push(Application {
            id,
            candidate_id: candidate_id.to_string(),
            vacancy_id,
            session_id,
            result,
            created_at: Utc::now(),
        });
        id
    }

    /// Newest snapshot per candidate for a vacancy, ranked by score
    /// (ties keep first-seen order)
    pub fn latest_applications(&self, vacancy_id: Uuid) -> Vec<&Application> {
        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, &Application> = HashMap::new();

        // Applications are append-only, so later entries are newer
        for app in self.applications.iter().filter(|a| a.vacancy_id == vacancy_id) {
            if latest.insert(&app.candidate_id, app).is_none() {
                order.push(&app.candidate_id);
            }
        }

        let mut ranked: Vec<&Application> = order
            .into_iter()
            .filter_map(|id| latest.get(id).copied())
            .collect();
        sort_by_score(&mut ranked, |app| app.result.score);
        ranked
    }

    /// All snapshots of one candidate, newest first
    pub fn applications_for(&self, candidate_id: &str) -> Vec<&Application> {
        let mut apps: Vec<&Application> = self
            .applications
            .iter()
            .filter(|a| a.candidate_id == candidate_id)
            .collect();
        apps.reverse();
        apps
    }

    /// Move a candidate through the pipeline, logging the change.
    /// Returns the previous status.
    pub fn set_status(
        &mut self,
        candidate_id: &str,
        to: CandidateStatus,
    ) -> Result<CandidateStatus> {
        let Some(candidate) = self.candidates.get_mut(candidate_id) else {
            anyhow::bail!("Unknown candidate '{}'", candidate_id);
        };
        let from = candidate.status;
        from.check_transition(to)?;
        candidate.status = to;

        self.log_activity(
            Some(candidate_id),
            ActivityKind::StatusChanged,
            format!("{} -> {}", from, to),
        );
        Ok(from)
    }

    pub fn add_note(&mut self, candidate_id: &str, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Note cannot be empty");
        }
        let Some(candidate) = self.candidates.get_mut(candidate_id) else {
            anyhow::bail!("Unknown candidate '{}'", candidate_id);
        };
        candidate.notes.push(Note {
            at: Utc::now(),
            text: text.to_string(),
        });
        self.log_activity(Some(candidate_id), ActivityKind::Note, text.to_string());
        Ok(())
    }

    /// Add a tag (case-insensitive dedupe). Returns false if already present.
    pub fn add_tag(&mut self, candidate_id: &str, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            anyhow::bail!("Tag cannot be empty");
        }
        let Some(candidate) = self.candidates.get_mut(candidate_id) else {
            anyhow::bail!("Unknown candidate '{}'", candidate_id);
        };
        if candidate.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return Ok(false);
        }
        candidate.tags.push(tag.to_string());
        Ok(true)
    }

    pub fn record_invitation(
        &mut self,
        candidate_id: &str,
        vacancy_id: Uuid,
        message: &str,
        outcome: std::result::Result<Option<String>, String>,
    ) -> Uuid {
        let now = Utc::now();
        let (status, hh_invitation_id, error) = match outcome {
            Ok(hh_id) => (InvitationStatus::Sent, hh_id, None),
            Err(e) => (InvitationStatus::Error, None, Some(e)),
        };
        let id = Uuid::new_v4();
        self.invitations.push(Invitation {
            id,
            candidate_id: candidate_id.to_string(),
            vacancy_id,
            hh_invitation_id,
            message: message.to_string(),
            status,
            error: error.clone(),
            created_at: now,
            updated_at: now,
        });

        let description = match error {
            Some(e) => format!("invitation failed: {}", e),
            None => "invitation sent".to_string(),
        };
        self.log_activity(Some(candidate_id), ActivityKind::Invitation, description);
        id
    }

    /// Update the newest invitation for a candidate. Returns true on change.
    pub fn update_invitation_status(&mut self, candidate_id: &str, status: InvitationStatus) -> bool {
        let Some(invitation) = self
            .invitations
            .iter_mut()
            .rev()
            .find(|i| i.candidate_id == candidate_id && i.status != InvitationStatus::Error)
        else {
            return false;
        };
        if invitation.status == status {
            return false;
        }
        invitation.status = status;
        invitation.updated_at = Utc::now();
        true
    }

    pub fn invitations_for(&self, candidate_id: &str) -> Vec<&Invitation> {
        self.invitations
            .iter()
            .filter(|i| i.candidate_id == candidate_id)
            .collect()
    }

    pub fn log_activity(&mut self, candidate_id: Option<&str>, kind: ActivityKind, description: String) {
        self.activities.push(Activity {
            at: Utc::now(),
            candidate_id: candidate_id.map(str::to_string),
            kind,
            description,
        });
    }

    pub fn activities_for(&self, candidate_id: &str) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.candidate_id.as_deref() == Some(candidate_id))
            .collect()
    }

    pub fn record_export(&mut self, vacancy_id: Option<Uuid>, path: &str, rows: usize) -> Uuid {
        let id = Uuid::new_v4();
        self.exports.push(ExportRecord {
            id,
            vacancy_id,
            path: path.to_string(),
            rows,
            created_at: Utc::now(),
        });
        self.log_activity(
            None,
            ActivityKind::Export,
            format!("exported {} rows to {}", rows, path),
        );
        id
    }
}
