pub mod formatter;

pub use formatter::{
    format_age, format_candidate_card, format_negotiations, format_progress, format_ranked_table,
    format_rating, format_score_detail, format_sessions, format_stars, format_tsv,
    should_use_colors, RankedRow,
};
