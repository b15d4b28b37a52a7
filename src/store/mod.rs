pub mod crm;
pub mod storage;
pub mod types;

pub use crm::{CandidateStatus, InvitationStatus, TransitionError};
pub use storage::{get_store_path, load_store, save_store};
pub use types::{
    Activity, ActivityKind, Application, CandidateRecord, ExportRecord, Invitation, Note,
    SearchSession, StoreState, VacancyRecord,
};

use anyhow::Result;
use std::path::PathBuf;

/// The store document together with the file it is persisted to
pub struct Store {
    path: PathBuf,
    pub state: StoreState,
}

impl Store {
    /// Open the store at `path`, or at the default location
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(get_store_path);
        let state = load_store(&path)?;
        tracing::debug!(path = %path.display(), candidates = state.candidates.len(), "store loaded");
        Ok(Self { path, state })
    }

    pub fn save(&self) -> Result<()> {
        save_store(&self.path, &self.state)
    }
}
