use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use tracker_core::TrackerError;
use tracker_core::comments::{
    commenter_username, is_timeline_owner, thread_comments, validate_comment, validate_parent,
};
use tracker_core::ownership::validate_email;
use tracker_core::redact::email_fingerprint;
use tracker_db::models::NewComment;
use tracker_types::api::{PostCommentRequest, UserCommentsQuery};
use tracker_types::{CommentThread, UserComment};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

pub async fn list_comments(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let comments = blocking(&state, move |db| {
        if db.get_timeline(timeline_id)?.is_none() {
            return Err(TrackerError::TimelineNotFound.into());
        }
        Ok(db.list_comments(timeline_id)?)
    })
    .await?;

    Ok(Json(thread_comments(comments)))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(timeline_id): Path<i64>,
    Json(req): Json<PostCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    let text = validate_comment(&email, &req.comment_text)?;
    let fingerprint = email_fingerprint(&email);

    let comment = blocking(&state, move |db| {
        let timeline = db
            .get_timeline(timeline_id)?
            .ok_or(TrackerError::TimelineNotFound)?;

        if let Some(parent_id) = req.parent_comment_id {
            let parent = db.get_comment(parent_id)?;
            validate_parent(parent.as_ref(), timeline_id)?;
        }

        let verified = db.verified_username(&email)?;
        let new_comment = NewComment {
            timeline_id,
            commenter_username: commenter_username(&email, verified.as_deref()),
            is_timeline_owner: is_timeline_owner(&timeline, &email),
            commenter_email: email,
            comment_text: text,
            parent_comment_id: req.parent_comment_id,
        };
        Ok(db.insert_comment(&new_comment)?)
    })
    .await?;

    info!(
        "Comment {} posted on timeline {} by {}",
        comment.id, timeline_id, fingerprint
    );
    Ok((StatusCode::CREATED, Json(comment)))
}

/// A user's comment history, newest first.
pub async fn user_comments(
    State(state): State<AppState>,
    Query(query): Query<UserCommentsQuery>,
) -> Result<Json<Vec<UserComment>>, ApiError> {
    let email = query.email.trim().to_string();
    validate_email(&email)?;

    let history = blocking(&state, move |db| {
        let mut history = Vec::new();
        for (comment, timeline) in db.comments_by_email(&email)? {
            let replies = db.reply_summaries(comment.id)?;
            history.push(UserComment {
                comment,
                timeline,
                reply_count: replies.len(),
                replies,
            });
        }
        Ok(history)
    })
    .await?;

    Ok(Json(history))
}
