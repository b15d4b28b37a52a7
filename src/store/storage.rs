use super::types::{StoreState, STORE_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default store file path (~/.config/hh-scout/store.json)
pub fn get_store_path() -> PathBuf {
    crate::config::get_config_dir().join("store.json")
}

/// Load the store from a JSON file
///
/// If the file doesn't exist, returns a new empty store.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> Result<StoreState> {
    if !path.exists() {
        return Ok(StoreState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open store file at {}", path.display()))?;

    let state: StoreState = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to load store from {}", path.display()))?;

    if state.version != STORE_VERSION {
        anyhow::bail!("Unsupported store version: {}", state.version);
    }

    Ok(state)
}

/// Save the store to a JSON file atomically
///
/// Uses atomic-write-file so the file is never left half-written.
/// Creates the parent directory if it doesn't exist.
pub fn save_store(path: &Path, state: &StoreState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, state).context("Failed to serialize store")?;

    file.commit().context("Failed to save store")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CandidateStatus;
    use std::env;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_path = env::temp_dir().join("hh_scout_test_missing_store.json");
        let _ = std::fs::remove_file(&temp_path);

        let state = load_store(&temp_path).unwrap();
        assert_eq!(state.version, STORE_VERSION);
        assert!(state.candidates.is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let temp_path = env::temp_dir().join("hh_scout_test_store_version.json");
        std::fs::write(&temp_path, r#"{"version": 7}"#).unwrap();

        let err = load_store(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported store version: 7"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = env::temp_dir().join("hh_scout_test_store_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        let temp_path = dir.join("store.json");

        let mut state = StoreState::new();
        let vacancy = state.upsert_vacancy(&crate::config::VacancyConfig {
            name: "Backend".to_string(),
            hh_vacancy_id: Some("777".to_string()),
            invite_message: None,
            search: crate::config::SearchParams {
                text: "go".to_string(),
                ..Default::default()
            },
            max_results: 10,
            scoring: crate::scoring::ScoringConfig::default(),
        });
        state.upsert_candidate(&crate::batch::ScoredCandidate {
            summary: crate::hh::ResumeSummary {
                id: "r1".to_string(),
                full_name: "Ivan Petrov".to_string(),
                ..Default::default()
            },
            input: Default::default(),
            resume_updated_at: None,
            result: crate::scoring::score_candidate(
                &Default::default(),
                &crate::scoring::ScoringConfig::default(),
            ),
        });
        state.set_status("r1", CandidateStatus::Contacted).unwrap();

        save_store(&temp_path, &state).unwrap();
        let loaded = load_store(&temp_path).unwrap();

        assert_eq!(loaded.version, STORE_VERSION);
        assert_eq!(loaded.vacancies[0].id, vacancy);
        assert_eq!(loaded.candidates["r1"].status, CandidateStatus::Contacted);
        assert_eq!(loaded.activities.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
