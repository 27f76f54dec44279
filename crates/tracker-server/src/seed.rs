use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use tracker_db::Database;
use tracker_types::api::TimelineDraft;

/// Load the seed file into an empty database. A database that already holds
/// timelines is left untouched.
pub fn seed_if_empty(db: &Database, path: &Path) -> Result<usize> {
    let existing = db.count_timelines()?;
    if existing > 0 {
        info!("Skipping seed: {} timelines already stored", existing);
        return Ok(0);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let drafts: Vec<TimelineDraft> = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed seed file {}", path.display()))?;

    db.seed_timelines(&drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn seed_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn seeds_only_once() {
        let db = Database::open_in_memory().unwrap();
        let file = seed_file(
            r#"[{"username":"alice","stream":"CEC","ita_date":"2024-01-05"},
                {"username":"bob","email":"b@x.com"}]"#,
        );

        assert_eq!(seed_if_empty(&db, file.path()).unwrap(), 2);
        assert_eq!(seed_if_empty(&db, file.path()).unwrap(), 0);
        assert_eq!(db.count_timelines().unwrap(), 2);
        assert!(db.list_timelines().unwrap().iter().all(|t| t.email.is_none()));
    }

    #[test]
    fn rejects_malformed_files() {
        let db = Database::open_in_memory().unwrap();
        let file = seed_file(r#"{"username":"alice"}"#);
        let err = seed_if_empty(&db, file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Malformed seed file"));
        assert_eq!(db.count_timelines().unwrap(), 0);
    }
}
