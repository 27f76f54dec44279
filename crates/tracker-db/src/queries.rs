use anyhow::{Result, anyhow};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tracing::info;

use tracker_types::api::{Facets, TimelineDraft, TimelinePatch};
use tracker_types::{Comment, DataSource, ReplySummary, TimelineRecord};

use crate::Database;
use crate::models::{
    COMMENT_COLUMNS, NewComment, TIMELINE_COLUMNS, comment_from_row, draft_columns,
    parse_timestamp, patch_columns, timeline_from_row,
};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Database {
    // -- Timelines --

    /// Every timeline, newest first.
    pub fn list_timelines(&self) -> Result<Vec<TimelineRecord>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TIMELINE_COLUMNS} FROM timelines ORDER BY created_at DESC, id DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], timeline_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_timeline(&self, id: i64) -> Result<Option<TimelineRecord>> {
        self.with_conn(|conn| query_timeline(conn, id))
    }

    /// Timelines currently stored under `email`, verified or not.
    pub fn timelines_by_email(&self, email: &str) -> Result<Vec<TimelineRecord>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TIMELINE_COLUMNS} FROM timelines WHERE email = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([email], timeline_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Username of the oldest timeline verified to `email`.
    pub fn verified_username(&self, email: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT username FROM timelines WHERE email = ?1 AND email_verified = 1 ORDER BY id LIMIT 1",
                [email],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn count_timelines(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM timelines", [], |r| r.get(0))?;
            Ok(usize::try_from(count)?)
        })
    }

    pub fn insert_timeline(
        &self,
        draft: &TimelineDraft,
        source: DataSource,
        email_verified: bool,
    ) -> Result<TimelineRecord> {
        self.with_conn_mut(|conn| {
            let id = insert_draft(conn, draft, source, email_verified)?;
            query_timeline(conn, id)?.ok_or_else(|| anyhow!("Inserted timeline {} vanished", id))
        })
    }

    /// Bulk import in one transaction. Seeded rows never carry an owner.
    pub fn seed_timelines(&self, drafts: &[TimelineDraft]) -> Result<usize> {
        let count = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for draft in drafts {
                let draft = TimelineDraft {
                    email: None,
                    ..draft.clone()
                };
                insert_draft(&tx, &draft, DataSource::Seed, false)?;
            }
            tx.commit()?;
            Ok(drafts.len())
        })?;

        info!("Seeded {} timelines", count);
        Ok(count)
    }

    /// Apply an owner's patch. Returns false when the timeline does not exist.
    pub fn update_timeline(&self, id: i64, patch: &TimelinePatch) -> Result<bool> {
        let now = now_rfc3339();
        let mut columns = patch_columns(patch);
        columns.push(("last_updated_by_user", Value::Text(now.clone())));
        columns.push(("updated_at", Value::Text(now)));

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE timelines SET {} WHERE id = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );

        let mut values: Vec<Value> = columns.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Integer(id));

        self.with_conn_mut(|conn| {
            let changed = conn.execute(&sql, params_from_iter(values))?;
            Ok(changed > 0)
        })
    }

    /// Attach `email` to an unowned timeline. The `email IS NULL` guard makes
    /// the first of two racing claims win; the loser gets false.
    pub fn claim_timeline(&self, id: i64, email: &str) -> Result<bool> {
        let now = now_rfc3339();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE timelines SET email = ?1, email_verified = 1, updated_at = ?2
                 WHERE id = ?3 AND (email IS NULL OR email = '')",
                params![email, now, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Distinct streams and primary visa offices, sorted.
    pub fn facets(&self) -> Result<Facets> {
        self.with_conn(|conn| {
            Ok(Facets {
                streams: distinct(conn, "stream")?,
                visa_offices: distinct(conn, "primary_visa_office")?,
            })
        })
    }

    // -- Comments --

    /// Visible comments on a timeline, oldest first.
    pub fn list_comments(&self, timeline_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} FROM timeline_comments
                 WHERE timeline_id = ?1 AND is_deleted = 0
                 ORDER BY created_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([timeline_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// A visible comment by id.
    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {COMMENT_COLUMNS} FROM timeline_comments WHERE id = ?1 AND is_deleted = 0");
            conn.query_row(&sql, [id], comment_from_row).optional()
        })
    }

    pub fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO timeline_comments
                    (timeline_id, commenter_email, commenter_username, comment_text, parent_comment_id, is_timeline_owner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    comment.timeline_id,
                    comment.commenter_email,
                    comment.commenter_username,
                    comment.comment_text,
                    comment.parent_comment_id,
                    comment.is_timeline_owner,
                ],
            )?;
            let id = conn.last_insert_rowid();

            let sql = format!("SELECT {COMMENT_COLUMNS} FROM timeline_comments WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], comment_from_row)?)
        })
    }

    /// Visible comments written by `email`, newest first, each with the
    /// timeline it belongs to.
    pub fn comments_by_email(&self, email: &str) -> Result<Vec<(Comment, Option<TimelineRecord>)>> {
        let comments = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} FROM timeline_comments
                 WHERE commenter_email = ?1 AND is_deleted = 0
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([email], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        comments
            .into_iter()
            .map(|c| {
                let timeline = self.get_timeline(c.timeline_id)?;
                Ok((c, timeline))
            })
            .collect()
    }

    /// Visible replies to one comment.
    pub fn reply_summaries(&self, comment_id: i64) -> Result<Vec<ReplySummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, commenter_username FROM timeline_comments
                 WHERE parent_comment_id = ?1 AND is_deleted = 0
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([comment_id], |row| {
                    let id: i64 = row.get(0)?;
                    let created_at: String = row.get(1)?;
                    Ok(ReplySummary {
                        id,
                        created_at: parse_timestamp(&created_at, "comment", id),
                        commenter_username: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Hide a comment from every read path. Comments are never hard-deleted.
    /// No route exposes this; moderation runs it directly against the database.
    pub fn soft_delete_comment(&self, id: i64) -> Result<bool> {
        let now = now_rfc3339();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE timeline_comments SET is_deleted = 1, updated_at = ?1 WHERE id = ?2 AND is_deleted = 0",
                params![now, id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_timeline(conn: &Connection, id: i64) -> Result<Option<TimelineRecord>> {
    let sql = format!("SELECT {TIMELINE_COLUMNS} FROM timelines WHERE id = ?1");
    conn.query_row(&sql, [id], timeline_from_row).optional()
}

fn insert_draft(
    conn: &Connection,
    draft: &TimelineDraft,
    source: DataSource,
    email_verified: bool,
) -> Result<i64> {
    let columns = draft_columns(draft, source, email_verified);
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO timelines ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );

    conn.execute(&sql, params_from_iter(columns.into_iter().map(|(_, v)| v)))?;
    Ok(conn.last_insert_rowid())
}

fn distinct(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM timelines
         WHERE {column} IS NOT NULL AND {column} != ''
         ORDER BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(values)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
