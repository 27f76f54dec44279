use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use tracker_core::ownership::{authorize_claim, authorize_submission, authorize_update};
use tracker_core::redact::email_fingerprint;
use tracker_core::{TrackerError, ViewState};
use tracker_types::api::{
    ClaimRequest, ClaimResponse, CreateTimelineResponse, Facets, MessageResponse, PageResponse,
    TimelineDraft, TimelineQuery, UpdateTimelineRequest,
};
use tracker_types::{DataSource, TimelineRecord};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

fn normalize_email(email: Option<&str>) -> Option<String> {
    email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string)
}

pub async fn list_timelines(
    State(state): State<AppState>,
) -> Result<Json<Vec<TimelineRecord>>, ApiError> {
    let timelines = blocking(&state, |db| Ok(db.list_timelines()?)).await?;
    Ok(Json(timelines))
}

/// One rendered page of the table: filtered, sorted and paged server-side
/// with the same engines the client uses.
pub async fn view_timelines(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<PageResponse>, ApiError> {
    let timelines = blocking(&state, |db| Ok(db.list_timelines()?)).await?;

    let view = ViewState::from_query(&query);
    let page = view.render(&timelines);
    debug!(
        "View sort={} page={}/{} rows={}",
        view.sort.key, page.page, page.total_pages, page.total
    );
    Ok(Json(page.to_response()))
}

pub async fn facets(State(state): State<AppState>) -> Result<Json<Facets>, ApiError> {
    let facets = blocking(&state, |db| Ok(db.facets()?)).await?;
    Ok(Json(facets))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TimelineRecord>, ApiError> {
    let timeline = blocking(&state, move |db| {
        db.get_timeline(id)?.ok_or(TrackerError::TimelineNotFound.into())
    })
    .await?;
    Ok(Json(timeline))
}

pub async fn create_timeline(
    State(state): State<AppState>,
    Json(draft): Json<TimelineDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(draft.email.as_deref());
    let fingerprint = email.as_deref().map(email_fingerprint);

    let timeline = blocking(&state, move |db| {
        let holders = match &email {
            Some(e) => db.timelines_by_email(e)?,
            None => Vec::new(),
        };
        authorize_submission(&draft.username, email.as_deref(), &holders)?;

        let verified = email.is_some();
        let draft = TimelineDraft { email, ..draft };
        Ok(db.insert_timeline(&draft, DataSource::UserSubmission, verified)?)
    })
    .await?;

    info!(
        "Timeline {} created for {} (owner {})",
        timeline.id,
        timeline.username,
        fingerprint.as_deref().unwrap_or("none")
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTimelineResponse {
            timeline,
            message: "Timeline created successfully!".into(),
        }),
    ))
}

pub async fn update_timeline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTimelineRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let fingerprint = email_fingerprint(&req.email);

    blocking(&state, move |db| {
        let timeline = db.get_timeline(id)?.ok_or(TrackerError::TimelineNotFound)?;
        authorize_update(&timeline, req.email.trim())?;

        if !db.update_timeline(id, &req.updates)? {
            return Err(TrackerError::TimelineNotFound.into());
        }
        Ok(())
    })
    .await?;

    info!("Timeline {} updated by {}", id, fingerprint);
    Ok(Json(MessageResponse {
        message: "Timeline updated successfully".into(),
    }))
}

pub async fn claim_timeline(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let email = req.email.trim().to_string();
    let fingerprint = email_fingerprint(&email);

    let username = blocking(&state, move |db| {
        let target = db.get_timeline(id)?.ok_or(TrackerError::TimelineNotFound)?;
        let holders = db.timelines_by_email(&email)?;
        authorize_claim(&target, &email, &holders)?;

        // Lost a race with another claim between the read and the write.
        if !db.claim_timeline(id, &email)? {
            return Err(TrackerError::AlreadyClaimed.into());
        }
        Ok(target.username)
    })
    .await
    .inspect_err(|e| debug!("Claim of timeline {} by {} rejected: {}", id, fingerprint, e))?;

    info!("Timeline {} claimed by {}", id, fingerprint);
    Ok(Json(ClaimResponse {
        message: format!("Timeline claimed successfully for {}!", username),
        timeline_id: id,
        username,
    }))
}
