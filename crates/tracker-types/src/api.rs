use serde::{Deserialize, Serialize};

use crate::models::{CaseDetails, MilestoneDates, TimelineRecord};

// -- Filtering and sorting --

/// Filter selectors as the filter panel sends them. Empty strings mean
/// "not filtering on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub stream: String,
    pub visa_office: String,
    #[serde(rename = "type")]
    pub application_type: String,
    pub complexity: String,
    pub completion_status: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: "ita_date".into(),
            direction: SortDirection::Asc,
        }
    }
}

/// Query string of `GET /timelines/view`. Kept flat: url-encoded query
/// parsing cannot feed numbers through `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimelineQuery {
    pub search: String,
    pub stream: String,
    pub visa_office: String,
    #[serde(rename = "type")]
    pub application_type: String,
    pub complexity: String,
    pub completion_status: String,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub page: Option<usize>,
}

impl TimelineQuery {
    pub fn filters(&self) -> FilterState {
        FilterState {
            stream: self.stream.clone(),
            visa_office: self.visa_office.clone(),
            application_type: self.application_type.clone(),
            complexity: self.complexity.clone(),
            completion_status: self.completion_status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub items: Vec<TimelineRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub per_page: usize,
}

/// Distinct values offered by the filter panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facets {
    pub streams: Vec<String>,
    pub visa_offices: Vec<String>,
}

// -- Timelines --

/// A new timeline as submitted, or one row of a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineDraft {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub dates: MilestoneDates,
    #[serde(flatten)]
    pub details: CaseDetails,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ircc_last_update: Option<String>,
}

/// Fields an owner may change. `None` leaves the stored value alone, an empty
/// string clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelinePatch {
    #[serde(flatten)]
    pub dates: MilestoneDates,
    #[serde(flatten)]
    pub details: CaseDetails,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ircc_last_update: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimelineResponse {
    pub timeline: TimelineRecord,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTimelineRequest {
    pub email: String,
    pub updates: TimelinePatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub message: String,
    pub timeline_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Comments --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCommentRequest {
    pub email: String,
    pub comment_text: String,
    #[serde(default)]
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserCommentsQuery {
    pub email: String,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
