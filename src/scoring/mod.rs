pub mod candidate;
pub mod config;
pub mod engine;
pub mod factors;
pub mod validation;

pub use candidate::{CandidateInput, SalaryExpectation};
pub use config::*;
pub use engine::{
    score_candidate, sort_by_score, stars_for, FactorContribution, Rating, ScoreBreakdown,
    ScoreResult, MAX_SCORE,
};
pub use factors::{EducationTier, ExperienceLevel, SearchActivity};
pub use validation::validate_scoring;
