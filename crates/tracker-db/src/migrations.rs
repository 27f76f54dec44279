use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (timelines and comments)");
        conn.execute_batch(
            "
            CREATE TABLE timelines (
                id                              INTEGER PRIMARY KEY AUTOINCREMENT,
                email                           TEXT,
                email_verified                  INTEGER NOT NULL DEFAULT 0,
                username                        TEXT NOT NULL,

                ita_date                        TEXT,
                aor_date                        TEXT,
                bio_req_date                    TEXT,
                medical_date                    TEXT,
                eligibility_check               TEXT,
                eligibility_completion_date     TEXT,
                bg_check                        TEXT,
                bg_completion_date              TEXT,
                final_decision_date             TEXT,
                ppr_p1_date                     TEXT,
                p2_passport_sent_date           TEXT,
                ecopr_passport_received_date    TEXT,
                pr_card_sent_date               TEXT,
                pr_card_received_date           TEXT,

                stream                          TEXT,
                application_type                TEXT,
                complexity                      TEXT,
                primary_visa_office             TEXT,
                secondary_visa_office           TEXT,
                country                         TEXT,

                notes                           TEXT,
                ircc_last_update                TEXT,

                last_updated_by_user            TEXT,
                created_at                      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at                      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                data_source                     TEXT NOT NULL DEFAULT 'seed',

                CHECK (email_verified = 0 OR (email IS NOT NULL AND email != ''))
            );

            CREATE INDEX idx_timelines_email ON timelines(email);
            CREATE INDEX idx_timelines_created ON timelines(created_at);

            CREATE TABLE timeline_comments (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                timeline_id         INTEGER NOT NULL REFERENCES timelines(id),
                commenter_email     TEXT NOT NULL,
                commenter_username  TEXT NOT NULL,
                comment_text        TEXT NOT NULL,
                parent_comment_id   INTEGER REFERENCES timeline_comments(id),
                is_timeline_owner   INTEGER NOT NULL DEFAULT 0,
                is_deleted          INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_comments_timeline ON timeline_comments(timeline_id, created_at);
            CREATE INDEX idx_comments_email ON timeline_comments(commenter_email);
            CREATE INDEX idx_comments_parent ON timeline_comments(parent_comment_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
