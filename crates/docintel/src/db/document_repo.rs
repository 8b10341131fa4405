//! Document repository: CRUD operations for the `documents` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::analysis::AnalysisResult;
use crate::document::{DocumentRecord, DocumentStatus, StatusEntry};

/// A raw document row from the database.
#[derive(Debug, Clone)]
struct DocumentRow {
    id: String,
    filename: String,
    current_status: String,
    status_history: String,
    extracted_text: Option<String>,
    analysis_result: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            current_status: row.get("current_status")?,
            status_history: row.get("status_history")?,
            extracted_text: row.get("extracted_text")?,
            analysis_result: row.get("analysis_result")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<DocumentRecord, DatabaseError> {
        let corrupt = |reason: String| DatabaseError::CorruptRow {
            id: self.id.clone(),
            reason,
        };

        let current_status: DocumentStatus = self
            .current_status
            .parse()
            .map_err(|e: crate::document::UnknownStatus| corrupt(e.to_string()))?;
        let status_history: Vec<StatusEntry> = serde_json::from_str(&self.status_history)
            .map_err(|e| corrupt(format!("status_history: {}", e)))?;
        let analysis_result = self
            .analysis_result
            .as_deref()
            .map(serde_json::from_str::<AnalysisResult>)
            .transpose()
            .map_err(|e| corrupt(format!("analysis_result: {}", e)))?;
        let created_at = parse_timestamp(&self.created_at).map_err(&corrupt)?;
        let updated_at = parse_timestamp(&self.updated_at).map_err(&corrupt)?;

        Ok(DocumentRecord {
            id: self.id,
            filename: self.filename,
            current_status,
            status_history,
            extracted_text: self.extracted_text,
            analysis_result,
            error_message: self.error_message,
            created_at,
            updated_at,
        })
    }
}

/// Fixed-width RFC 3339 so lexical order matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("timestamp '{}': {}", value, e))
}

/// Query filter parameters for document listing.
#[derive(Debug, Default, Clone)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
}

/// Inserts a new document row.
pub fn insert(db: &Database, record: &DocumentRecord) -> Result<(), DatabaseError> {
    let history = serde_json::to_string(&record.status_history)?;
    let analysis = record
        .analysis_result
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, filename, current_status, status_history, extracted_text,
             analysis_result, error_message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.filename,
                record.current_status.as_str(),
                history,
                record.extracted_text,
                analysis,
                record.error_message,
                format_timestamp(&record.created_at),
                format_timestamp(&record.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRecord>, DatabaseError> {
    let row = db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id],
                DocumentRow::from_row,
            )
            .optional()?;
        Ok(row)
    })?;

    row.map(DocumentRow::into_record).transpose()
}

/// Lists documents newest first, optionally restricted to one status.
pub fn list(db: &Database, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let rows = match filter.status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM documents WHERE current_status = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )?;
                let rows = stmt
                    .query_map(params![status.as_str()], DocumentRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM documents ORDER BY created_at DESC, rowid DESC",
                )?;
                let rows = stmt
                    .query_map([], DocumentRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })?;

    rows.into_iter().map(DocumentRow::into_record).collect()
}

/// IDs of every document currently in `status`, oldest first.
pub fn find_ids_by_status_oldest_first(
    db: &Database,
    status: DocumentStatus,
) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id FROM documents WHERE current_status = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let ids = stmt
            .query_map(params![status.as_str()], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}

/// Persists a status transition already applied to `record` in memory.
///
/// Status, history, analysis result, error message and `updated_at` are
/// written in one transaction. Fails with [`DatabaseError::NotFound`] when
/// the row no longer exists.
pub fn apply_transition(db: &Database, record: &DocumentRecord) -> Result<(), DatabaseError> {
    let history = serde_json::to_string(&record.status_history)?;
    let analysis = record
        .analysis_result
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE documents SET current_status = ?2, status_history = ?3,
             analysis_result = ?4, error_message = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                record.id,
                record.current_status.as_str(),
                history,
                analysis,
                record.error_message,
                format_timestamp(&record.updated_at),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(record.id.clone()));
        }
        tx.commit()?;
        Ok(())
    })
}

/// Stores the extraction output for a document.
pub fn set_extracted_text(db: &Database, id: &str, text: &str) -> Result<(), DatabaseError> {
    let now = format_timestamp(&Utc::now());
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE documents SET extracted_text = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, text, now],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }
        Ok(())
    })
}

/// Deletes a document row. Returns false when no row matched.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Sentiment;
    use chrono::{Duration, TimeZone};

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn record_at(id: &str, minutes: i64) -> DocumentRecord {
        let mut record = DocumentRecord::new_pending(id, "memo.txt");
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        record.created_at = base + Duration::minutes(minutes);
        record.updated_at = record.created_at;
        record
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let record = DocumentRecord::new_pending("doc-1", "memo.txt");
        insert(&db, &record).unwrap();

        let found = find_by_id(&db, "doc-1").unwrap().unwrap();
        assert_eq!(found.filename, "memo.txt");
        assert_eq!(found.current_status, DocumentStatus::Pending);
        assert_eq!(found.history_statuses(), vec![DocumentStatus::Pending]);
        assert!(found.extracted_text.is_none());
        assert!(found.analysis_result.is_none());
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_apply_transition_persists_history_and_result() {
        let db = test_db();
        let mut record = DocumentRecord::new_pending("doc-2", "memo.txt");
        insert(&db, &record).unwrap();

        record.advance(DocumentStatus::Processing).unwrap();
        apply_transition(&db, &record).unwrap();
        record.advance(DocumentStatus::Analyzing).unwrap();
        apply_transition(&db, &record).unwrap();
        record
            .complete(AnalysisResult {
                summary: "ok".to_string(),
                key_topics: vec!["a".to_string()],
                sentiment: Sentiment::Positive,
                actionable_items: vec!["reply".to_string()],
            })
            .unwrap();
        apply_transition(&db, &record).unwrap();

        let found = find_by_id(&db, "doc-2").unwrap().unwrap();
        assert_eq!(found.current_status, DocumentStatus::Completed);
        assert_eq!(found.status_history.len(), 4);
        assert_eq!(
            found.analysis_result.unwrap().sentiment,
            Sentiment::Positive
        );
    }

    #[test]
    fn test_apply_transition_missing_row_is_not_found() {
        let db = test_db();
        let mut record = DocumentRecord::new_pending("ghost", "ghost.txt");
        record.advance(DocumentStatus::Processing).unwrap();

        let err = apply_transition(&db, &record).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_set_extracted_text() {
        let db = test_db();
        insert(&db, &DocumentRecord::new_pending("doc-3", "memo.txt")).unwrap();

        set_extracted_text(&db, "doc-3", "hello world").unwrap();
        let found = find_by_id(&db, "doc-3").unwrap().unwrap();
        assert_eq!(found.extracted_text.as_deref(), Some("hello world"));

        assert!(matches!(
            set_extracted_text(&db, "missing", "x"),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_ids_by_status_oldest_first() {
        let db = test_db();
        insert(&db, &record_at("late", 30)).unwrap();
        insert(&db, &record_at("early", 10)).unwrap();
        insert(&db, &record_at("middle", 20)).unwrap();

        let mut done = record_at("done", 0);
        done.advance(DocumentStatus::Processing).unwrap();
        done.fail("broken").unwrap();
        insert(&db, &done).unwrap();

        let ids = find_ids_by_status_oldest_first(&db, DocumentStatus::Pending).unwrap();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_list_newest_first_with_filter() {
        let db = test_db();
        insert(&db, &record_at("a", 1)).unwrap();
        insert(&db, &record_at("b", 2)).unwrap();

        let mut failed = record_at("c", 3);
        failed.advance(DocumentStatus::Processing).unwrap();
        failed.fail("bad").unwrap();
        insert(&db, &failed).unwrap();

        let all = list(&db, &DocumentFilter::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let pending = list(
            &db,
            &DocumentFilter {
                status: Some(DocumentStatus::Pending),
            },
        )
        .unwrap();
        let pending_ids: Vec<_> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(pending_ids, vec!["b", "a"]);
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        insert(&db, &DocumentRecord::new_pending("doc-4", "memo.txt")).unwrap();

        assert!(delete(&db, "doc-4").unwrap());
        assert!(!delete(&db, "doc-4").unwrap());
        assert!(find_by_id(&db, "doc-4").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let db = test_db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, filename, current_status, created_at, updated_at)
                 VALUES ('bad', 'x.txt', 'archived', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(
            find_by_id(&db, "bad"),
            Err(DatabaseError::CorruptRow { .. })
        ));
    }
}
