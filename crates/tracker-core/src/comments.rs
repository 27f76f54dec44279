use std::collections::HashMap;

use chrono::{DateTime, Utc};

use tracker_types::{Comment, CommentThread, TimelineRecord};

use crate::error::TrackerError;
use crate::ownership::validate_email;

pub const MAX_COMMENT_CHARS: usize = 2000;

/// Validate a new comment and return its trimmed text.
pub fn validate_comment(email: &str, text: &str) -> Result<String, TrackerError> {
    validate_email(email)?;

    let text = text.trim();
    if text.is_empty() {
        return Err(TrackerError::EmptyComment);
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(TrackerError::CommentTooLong {
            max: MAX_COMMENT_CHARS,
        });
    }
    Ok(text.to_string())
}

/// Replies attach to top-level comments of the same timeline only.
pub fn validate_parent(parent: Option<&Comment>, timeline_id: i64) -> Result<(), TrackerError> {
    match parent {
        Some(p) if p.timeline_id == timeline_id && p.parent_comment_id.is_none() && !p.is_deleted => {
            Ok(())
        }
        _ => Err(TrackerError::InvalidParentComment),
    }
}

/// Display name for a commenter: the username of the timeline verified to
/// their email, else the local part of the address.
pub fn commenter_username(email: &str, verified_username: Option<&str>) -> String {
    match verified_username.filter(|u| !u.is_empty()) {
        Some(username) => username.to_string(),
        None => email.split('@').next().unwrap_or_default().to_string(),
    }
}

/// Snapshot taken when the comment is posted; later claims do not change it.
pub fn is_timeline_owner(record: &TimelineRecord, email: &str) -> bool {
    record.verified_email() == Some(email)
}

/// Group comments (oldest first) into top-level threads. Deleted comments and
/// replies whose parent is missing or is itself a reply are dropped.
pub fn thread_comments(comments: Vec<Comment>) -> Vec<CommentThread> {
    let (top_level, replies): (Vec<Comment>, Vec<Comment>) = comments
        .into_iter()
        .filter(|c| !c.is_deleted)
        .partition(|c| c.parent_comment_id.is_none());

    let mut by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.parent_comment_id {
            by_parent.entry(parent).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

/// Comments (replies included) newer than the last visit. Everything counts
/// when the thread was never opened on this device.
pub fn unread_count(threads: &[CommentThread], last_viewed: Option<DateTime<Utc>>) -> usize {
    threads
        .iter()
        .flat_map(|t| std::iter::once(&t.comment).chain(t.replies.iter()))
        .filter(|c| last_viewed.is_none_or(|seen| c.created_at > seen))
        .count()
}
