pub mod cache;
pub mod client;
pub mod negotiations;
pub mod resumes;
pub mod types;
pub mod vacancies;

pub use cache::{clear_cache, get_cache_path, DiskCache};
pub use client::{ApiError, HhClient};
pub use types::{
    format_experience, format_salary, parse_hh_timestamp, HhVacancy, Negotiation,
    NegotiationPage, Resume, ResumePage, ResumeSummary,
};
