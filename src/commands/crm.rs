use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};

use super::{find_vacancy, Context};
use crate::browser::open_url;
use crate::hh::{HhClient, Negotiation, Resume};
use crate::output::{format_candidate_card, format_negotiations, should_use_colors};
use crate::store::{ActivityKind, CandidateStatus, InvitationStatus, StoreState};

pub const DEFAULT_INVITE_MESSAGE: &str =
    "Hello, {name}! We'd like to invite you to talk about the {vacancy} position.";

/// Upper bound on negotiation pages fetched by one `negotiations` run
const MAX_NEGOTIATION_PAGES: u32 = 20;

/// Substitute `{name}` and `{vacancy}` in an invitation template
pub fn fill_template(template: &str, name: &str, vacancy: &str) -> String {
    let name = if name.trim().is_empty() {
        "candidate"
    } else {
        name.trim()
    };
    template.replace("{name}", name).replace("{vacancy}", vacancy)
}

pub fn run_status(ctx: &Context, query: &str, status: &str) -> Result<()> {
    let to: CandidateStatus = status.parse().map_err(anyhow::Error::msg)?;
    let mut store = ctx.store()?;
    let id = store.state.find_candidate(query)?.id.clone();

    let from = store
        .state
        .set_status(&id, to)
        .with_context(|| format!("Cannot change status of {}", id))?;
    store.save()?;

    println!("{}: {} -> {}", id, from, to);
    Ok(())
}

pub fn run_note(ctx: &Context, query: &str, text: &str) -> Result<()> {
    let mut store = ctx.store()?;
    let id = store.state.find_candidate(query)?.id.clone();
    store.state.add_note(&id, text)?;
    store.save()?;

    println!("Note added to {}", id);
    Ok(())
}

pub fn run_tag(ctx: &Context, query: &str, tag: &str) -> Result<()> {
    let mut store = ctx.store()?;
    let id = store.state.find_candidate(query)?.id.clone();
    if store.state.add_tag(&id, tag)? {
        store.save()?;
        println!("Tagged {} with '{}'", id, tag.trim());
    } else {
        println!("{} is already tagged '{}'", id, tag.trim());
    }
    Ok(())
}

/// Replace a stored candidate's résumé data with a freshly fetched résumé.
/// CRM fields are untouched. Returns false for unknown candidates.
pub(crate) fn apply_resume(state: &mut StoreState, resume: &Resume, as_of: DateTime<Utc>) -> bool {
    let Some(candidate) = state.candidates.get_mut(&resume.id) else {
        return false;
    };
    candidate.summary = resume.summary();
    candidate.input = resume.to_candidate_input(as_of);
    candidate.resume_updated_at = resume.updated_at();
    candidate.last_seen = as_of;
    true
}

/// Print a candidate card. With `refresh`, the full résumé (including
/// contacts, which search results omit) is fetched and stored first.
pub async fn run_show(ctx: &Context, query: &str, refresh: bool) -> Result<()> {
    let mut store = ctx.store()?;

    if refresh {
        let id = store.state.find_candidate(query)?.id.clone();
        let config = ctx.config()?;
        let client = ctx.client(&config).await?;
        let resume = client
            .get_resume(&id)
            .await
            .with_context(|| format!("Failed to fetch résumé {}", id))?;
        if apply_resume(&mut store.state, &resume, Utc::now()) {
            store.save()?;
            tracing::debug!(candidate = %id, "résumé refreshed");
        }
    }

    let state = &store.state;
    let candidate = state.find_candidate(query)?;

    let applications: Vec<_> = state
        .applications_for(&candidate.id)
        .into_iter()
        .map(|app| {
            let vacancy = state.vacancy(app.vacancy_id).map(|v| v.name.as_str());
            (app, vacancy)
        })
        .collect();
    let invitations = state.invitations_for(&candidate.id);
    let activities = state.activities_for(&candidate.id);

    println!(
        "{}",
        format_candidate_card(
            candidate,
            &applications,
            &invitations,
            &activities,
            should_use_colors()
        )
    );
    Ok(())
}

pub fn run_open(ctx: &Context, query: &str) -> Result<()> {
    let store = ctx.store()?;
    let candidate = store.state.find_candidate(query)?;
    let url = &candidate.summary.resume_url;
    if url.is_empty() {
        anyhow::bail!("No résumé link stored for {}", candidate.id);
    }
    open_url(url)
}

/// Vacancy an invitation is for: the named one, or the one the candidate
/// was most recently scored against
fn invite_vacancy_name(state: &StoreState, candidate_id: &str, named: Option<&str>) -> Result<String> {
    if let Some(name) = named {
        return Ok(name.to_string());
    }
    state
        .applications_for(candidate_id)
        .first()
        .and_then(|app| state.vacancy(app.vacancy_id))
        .map(|v| v.name.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "{} has not been scored for any vacancy; pass --vacancy",
                candidate_id
            )
        })
}

pub async fn run_invite(
    ctx: &Context,
    query: &str,
    vacancy: Option<&str>,
    message: Option<&str>,
) -> Result<()> {
    let config = ctx.config()?;
    let mut store = ctx.store()?;
    let candidate = store.state.find_candidate(query)?;
    let candidate_id = candidate.id.clone();
    let full_name = candidate.summary.full_name.clone();

    let vacancy_name = invite_vacancy_name(&store.state, &candidate_id, vacancy)?;
    let vacancy = find_vacancy(&config, &vacancy_name)?;
    let Some(hh_vacancy_id) = vacancy.hh_vacancy_id.as_deref() else {
        anyhow::bail!(
            "Vacancy '{}' has no hh_vacancy_id; invitations need a published vacancy",
            vacancy.name
        );
    };

    let template = message
        .or(vacancy.invite_message.as_deref())
        .unwrap_or(DEFAULT_INVITE_MESSAGE);
    let text = fill_template(template, &full_name, &vacancy.name);

    let client = ctx.client(&config).await?;
    let sent = client
        .send_invitation(hh_vacancy_id, &candidate_id, &text)
        .await;

    let vacancy_id = store.state.upsert_vacancy(vacancy);
    let outcome = sent.as_ref().cloned().map_err(|e| format!("{:#}", e));
    store
        .state
        .record_invitation(&candidate_id, vacancy_id, &text, outcome);

    if sent.is_ok() {
        let status = store.state.candidates.get(&candidate_id).map(|c| c.status);
        if status == Some(CandidateStatus::New) {
            store.state.set_status(&candidate_id, CandidateStatus::Contacted)?;
        }
    }
    store.save()?;

    match sent {
        Ok(_) => {
            tracing::info!(candidate = %candidate_id, vacancy = %vacancy.name, "invitation sent");
            println!("Invitation sent to {} for '{}'", candidate_id, vacancy.name);
            Ok(())
        }
        Err(e) => Err(e.context(format!("Failed to invite {}", candidate_id))),
    }
}

/// Fold negotiation states into stored invitations. Returns how many changed.
pub(crate) fn sync_invitations(state: &mut StoreState, negotiations: &[Negotiation]) -> usize {
    let mut changed = 0;
    for negotiation in negotiations {
        let Some(resume) = negotiation.resume.as_ref() else {
            continue;
        };
        let messages = negotiation.counters.as_ref().map_or(0, |c| c.messages);
        let Some(status) = InvitationStatus::from_negotiation(
            &negotiation.state.id,
            negotiation.has_updates,
            messages,
        ) else {
            continue;
        };
        if state.update_invitation_status(&resume.id, status) {
            changed += 1;
        }
    }
    changed
}

async fn fetch_negotiations(client: &HhClient, vacancy_id: Option<&str>) -> Result<Vec<Negotiation>> {
    let mut all = Vec::new();
    let mut page = 0;
    loop {
        let batch = client.list_negotiations(vacancy_id, page).await?;
        let pages = batch.pages;
        if batch.items.is_empty() {
            break;
        }
        all.extend(batch.items);
        page += 1;
        if page >= pages || page >= MAX_NEGOTIATION_PAGES {
            break;
        }
    }
    Ok(all)
}

pub async fn run_negotiations(ctx: &Context, vacancy: Option<&str>) -> Result<()> {
    let config = ctx.config()?;
    let hh_vacancy_id = match vacancy {
        Some(name) => {
            let vacancy = find_vacancy(&config, name)?;
            Some(vacancy.hh_vacancy_id.clone().ok_or_else(|| {
                anyhow::anyhow!("Vacancy '{}' has no hh_vacancy_id", vacancy.name)
            })?)
        }
        None => None,
    };

    let client = ctx.client(&config).await?;
    let negotiations = fetch_negotiations(&client, hh_vacancy_id.as_deref())
        .await
        .context("Failed to list negotiations")?;

    let mut store = ctx.store()?;
    let changed = sync_invitations(&mut store.state, &negotiations);
    if changed > 0 {
        store.save()?;
        tracing::info!(changed, "invitation statuses updated");
    }

    println!("{}", format_negotiations(&negotiations, should_use_colors()));
    if changed > 0 {
        eprintln!("Updated {} invitation(s)", changed);
    }
    Ok(())
}

pub async fn run_message(
    ctx: &Context,
    negotiation_id: &str,
    text: &str,
    candidate: Option<&str>,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Message cannot be empty");
    }

    let config = ctx.config()?;
    let mut store = ctx.store()?;
    let candidate_id = candidate
        .map(|q| store.state.find_candidate(q).map(|c| c.id.clone()))
        .transpose()?;

    let client = ctx.client(&config).await?;
    client
        .send_negotiation_message(negotiation_id, text)
        .await
        .with_context(|| format!("Failed to send message to negotiation {}", negotiation_id))?;

    store.state.log_activity(
        candidate_id.as_deref(),
        ActivityKind::Message,
        format!("negotiation {}: {}", negotiation_id, text),
    );
    store.save()?;

    println!("Message sent to negotiation {}", negotiation_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hh::types::{IdName, NegotiationCounters, NegotiationResume};
    use crate::store::Store;
    use uuid::Uuid;

    fn temp_ctx(name: &str) -> (Context, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let ctx = Context {
            store_path: Some(dir.join("store.json")),
            ..Context::default()
        };
        let mut store = ctx.store().unwrap();
        seed_candidate(&mut store.state, "abc123", "Ivan Petrov");
        store.save().unwrap();
        (ctx, dir)
    }

    fn seed_candidate(state: &mut StoreState, id: &str, name: &str) -> Uuid {
        use crate::batch::ScoredCandidate;
        use crate::config::VacancyConfig;
        use crate::scoring::{score_candidate, CandidateInput, ScoringConfig};

        let vacancy_id = state.upsert_vacancy(&VacancyConfig {
            name: "backend".to_string(),
            hh_vacancy_id: Some("777".to_string()),
            invite_message: None,
            search: Default::default(),
            max_results: 20,
            scoring: ScoringConfig::default(),
        });
        let input = CandidateInput::default();
        let scored = ScoredCandidate {
            summary: crate::hh::ResumeSummary {
                id: id.to_string(),
                full_name: name.to_string(),
                resume_url: format!("https://hh.ru/resume/{}", id),
                ..Default::default()
            },
            result: score_candidate(&input, &ScoringConfig::default()),
            input,
            resume_updated_at: None,
        };
        state.upsert_candidate(&scored);
        state.record_application(id, vacancy_id, None, scored.result);
        vacancy_id
    }

    fn negotiation(resume_id: &str, state: &str, has_updates: bool, messages: u32) -> Negotiation {
        Negotiation {
            id: format!("n-{}", resume_id),
            state: IdName {
                id: state.to_string(),
                name: None,
            },
            created_at: None,
            updated_at: None,
            resume: Some(NegotiationResume {
                id: resume_id.to_string(),
                title: None,
            }),
            has_updates,
            counters: Some(NegotiationCounters {
                messages,
                unread_messages: 0,
            }),
        }
    }

    #[test]
    fn test_fill_template() {
        assert_eq!(
            fill_template("Hi {name}, join {vacancy}!", "Anna", "backend"),
            "Hi Anna, join backend!"
        );
        assert_eq!(
            fill_template("Hi {name}", "  ", "backend"),
            "Hi candidate"
        );
        assert_eq!(fill_template("No placeholders", "Anna", "x"), "No placeholders");
    }

    #[test]
    fn test_status_and_note_are_persisted() {
        let (ctx, dir) = temp_ctx("hh_scout_test_crm_status");

        run_status(&ctx, "Ivan", "interview").unwrap();
        run_note(&ctx, "abc", "Strong on Go").unwrap();
        run_tag(&ctx, "abc123", "go").unwrap();
        run_tag(&ctx, "abc123", "GO").unwrap();

        let store = Store::open(ctx.store_path.clone()).unwrap();
        let candidate = &store.state.candidates["abc123"];
        assert_eq!(candidate.status, CandidateStatus::Interview);
        assert_eq!(candidate.notes.len(), 1);
        assert_eq!(candidate.tags, vec!["go"]);
        assert_eq!(store.state.activities_for("abc123").len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_backwards_status_is_rejected() {
        let (ctx, dir) = temp_ctx("hh_scout_test_crm_backwards");

        run_status(&ctx, "abc123", "offer").unwrap();
        let err = run_status(&ctx, "abc123", "contacted").unwrap_err();
        assert_eq!(super::super::exit_code_for(&err), super::super::EXIT_OTHER);
        assert!(run_status(&ctx, "abc123", "promoted").is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invite_vacancy_defaults_to_latest_application() {
        let mut state = StoreState::new();
        seed_candidate(&mut state, "abc123", "Ivan Petrov");

        assert_eq!(
            invite_vacancy_name(&state, "abc123", None).unwrap(),
            "backend"
        );
        assert_eq!(
            invite_vacancy_name(&state, "abc123", Some("frontend")).unwrap(),
            "frontend"
        );
        assert!(invite_vacancy_name(&state, "nobody", None).is_err());
    }

    #[test]
    fn test_apply_resume_keeps_crm_fields() {
        let mut state = StoreState::new();
        seed_candidate(&mut state, "abc123", "Ivan Petrov");
        state.set_status("abc123", CandidateStatus::Contacted).unwrap();

        let resume: Resume = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "title": "Senior Go developer",
            "first_name": "Ivan",
            "last_name": "Petrov",
            "contact": [{"type": {"id": "email"}, "value": "ivan@example.com"}]
        }))
        .unwrap();
        assert!(apply_resume(&mut state, &resume, Utc::now()));

        let candidate = &state.candidates["abc123"];
        assert_eq!(candidate.summary.title, "Senior Go developer");
        assert_eq!(candidate.status, CandidateStatus::Contacted);

        let stranger = Resume {
            id: "zzz".to_string(),
            ..Resume::default()
        };
        assert!(!apply_resume(&mut state, &stranger, Utc::now()));
    }

    #[test]
    fn test_sync_invitations() {
        let mut state = StoreState::new();
        let vacancy_id = seed_candidate(&mut state, "abc123", "Ivan Petrov");
        seed_candidate(&mut state, "def456", "Olga Smirnova");
        state.record_invitation("abc123", vacancy_id, "hi", Ok(Some("1".to_string())));
        state.record_invitation("def456", vacancy_id, "hi", Ok(None));

        let negotiations = vec![
            negotiation("abc123", "invitation", true, 1),
            negotiation("def456", "discard_by_applicant", false, 0),
            negotiation("zzz999", "interview", false, 3),
        ];
        assert_eq!(sync_invitations(&mut state, &negotiations), 2);
        assert_eq!(state.invitations_for("abc123")[0].status, InvitationStatus::Viewed);
        assert_eq!(state.invitations_for("def456")[0].status, InvitationStatus::Rejected);

        // A second pass with the same data changes nothing
        assert_eq!(sync_invitations(&mut state, &negotiations), 0);
    }
}
