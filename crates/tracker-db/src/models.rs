//! Row mapping between SQLite and the shared models.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Value;
use tracing::warn;

use tracker_types::api::{TimelineDraft, TimelinePatch};
use tracker_types::{CaseDetails, Comment, DataSource, Milestone, MilestoneDates, TimelineRecord};

pub const TIMELINE_COLUMNS: &str = "id, email, email_verified, username, \
    ita_date, aor_date, bio_req_date, medical_date, eligibility_check, \
    eligibility_completion_date, bg_check, bg_completion_date, final_decision_date, \
    ppr_p1_date, p2_passport_sent_date, ecopr_passport_received_date, \
    pr_card_sent_date, pr_card_received_date, \
    stream, application_type, complexity, primary_visa_office, secondary_visa_office, country, \
    notes, ircc_last_update, last_updated_by_user, created_at, updated_at, data_source";

pub const COMMENT_COLUMNS: &str = "id, timeline_id, commenter_email, commenter_username, \
    comment_text, parent_comment_id, is_timeline_owner, is_deleted, created_at, updated_at";

/// A comment about to be inserted.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub timeline_id: i64,
    pub commenter_email: String,
    pub commenter_username: String,
    pub comment_text: String,
    pub parent_comment_id: Option<i64>,
    pub is_timeline_owner: bool,
}

/// Timestamps are written as RFC 3339; older rows may carry SQLite's
/// `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn parse_timestamp(raw: &str, table: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} {}: {}", raw, table, id, e);
            DateTime::default()
        })
}

pub(crate) fn timeline_from_row(row: &Row<'_>) -> rusqlite::Result<TimelineRecord> {
    let id: i64 = row.get("id")?;

    let mut dates = MilestoneDates::default();
    for milestone in Milestone::ALL {
        dates.set(milestone, row.get(milestone.column())?);
    }

    let details = CaseDetails {
        stream: row.get("stream")?,
        application_type: row.get("application_type")?,
        complexity: row.get("complexity")?,
        primary_visa_office: row.get("primary_visa_office")?,
        secondary_visa_office: row.get("secondary_visa_office")?,
        country: row.get("country")?,
    };

    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let data_source: Option<String> = row.get("data_source")?;

    Ok(TimelineRecord {
        id,
        email: row.get("email")?,
        email_verified: row.get("email_verified")?,
        username: row.get("username")?,
        dates,
        details,
        notes: row.get("notes")?,
        ircc_last_update: row.get("ircc_last_update")?,
        last_updated_by_user: row.get("last_updated_by_user")?,
        created_at: parse_timestamp(&created_at, "timeline", id),
        updated_at: parse_timestamp(&updated_at, "timeline", id),
        data_source: DataSource::from_tag(data_source.as_deref()),
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let id: i64 = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Comment {
        id,
        timeline_id: row.get("timeline_id")?,
        commenter_email: row.get("commenter_email")?,
        commenter_username: row.get("commenter_username")?,
        comment_text: row.get("comment_text")?,
        parent_comment_id: row.get("parent_comment_id")?,
        is_timeline_owner: row.get("is_timeline_owner")?,
        is_deleted: row.get("is_deleted")?,
        created_at: parse_timestamp(&created_at, "comment", id),
        updated_at: parse_timestamp(&updated_at, "comment", id),
    })
}

/// Blank input is stored as NULL.
fn text(value: Option<&str>) -> Value {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Value::Text(v.to_string()),
        None => Value::Null,
    }
}

fn detail_columns(details: &CaseDetails) -> [(&'static str, Option<&String>); 6] {
    [
        ("stream", details.stream.as_ref()),
        ("application_type", details.application_type.as_ref()),
        ("complexity", details.complexity.as_ref()),
        ("primary_visa_office", details.primary_visa_office.as_ref()),
        ("secondary_visa_office", details.secondary_visa_office.as_ref()),
        ("country", details.country.as_ref()),
    ]
}

/// Column/value pairs for inserting a draft.
pub(crate) fn draft_columns(
    draft: &TimelineDraft,
    source: DataSource,
    email_verified: bool,
) -> Vec<(&'static str, Value)> {
    let mut columns = vec![
        ("email", text(draft.email.as_deref())),
        ("email_verified", Value::Integer(i64::from(email_verified))),
        ("username", Value::Text(draft.username.trim().to_string())),
    ];
    for milestone in Milestone::ALL {
        columns.push((milestone.column(), text(draft.dates.get(milestone))));
    }
    for (column, value) in detail_columns(&draft.details) {
        columns.push((column, text(value.map(String::as_str))));
    }
    columns.push(("notes", text(draft.notes.as_deref())));
    columns.push(("ircc_last_update", text(draft.ircc_last_update.as_deref())));
    columns.push(("data_source", Value::Text(source.as_str().to_string())));
    columns
}

/// Column/value pairs for the fields a patch actually sets.
pub(crate) fn patch_columns(patch: &TimelinePatch) -> Vec<(&'static str, Value)> {
    let mut columns = Vec::new();
    for milestone in Milestone::ALL {
        if let Some(value) = patch.dates.raw(milestone) {
            columns.push((milestone.column(), text(Some(value))));
        }
    }
    for (column, value) in detail_columns(&patch.details) {
        if let Some(value) = value {
            columns.push((column, text(Some(value))));
        }
    }
    if let Some(notes) = &patch.notes {
        columns.push(("notes", text(Some(notes))));
    }
    if let Some(update) = &patch.ircc_last_update {
        columns.push(("ircc_last_update", text(Some(update))));
    }
    columns
}
