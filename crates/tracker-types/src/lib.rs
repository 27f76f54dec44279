pub mod api;
pub mod models;

pub use models::{
    CaseDetails, Comment, CommentThread, DataSource, Milestone, MilestoneDates, ReplySummary,
    TimelineRecord, UserComment,
};
