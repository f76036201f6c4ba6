use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task::spawn_blocking;
use tracing::info;

use crate::survey::types::{FormReference, Survey, SurveyFilter, SurveyPage, SurveyStatus};

use super::{StoreError, SurveyRepository};

const SURVEY_COLUMNS: &str = "id, title, description, questions, status, created_at, approved_at, \
    response_count, approver, form_id, form_url, edit_url, created_by";

/// SQLite-backed store. One connection, serialised behind a mutex and only
/// touched from the blocking pool.
pub struct SqliteSurveyStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSurveyStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened survey database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// SQLite reads a negative OFFSET as zero, so out-of-range skips saturate.
fn sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS surveys (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            questions TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            approved_at TEXT,
            response_count INTEGER NOT NULL DEFAULT 0,
            approver TEXT,
            form_id TEXT,
            form_url TEXT,
            edit_url TEXT,
            created_by TEXT NOT NULL
          );
          CREATE INDEX IF NOT EXISTS idx_surveys_status ON surveys(status);",
    )?;
    Ok(())
}

struct SurveyRow {
    id: String,
    title: String,
    description: String,
    questions: Option<String>,
    status: String,
    created_at: String,
    approved_at: Option<String>,
    response_count: u32,
    approver: Option<String>,
    form_id: Option<String>,
    form_url: Option<String>,
    edit_url: Option<String>,
    created_by: String,
}

impl SurveyRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            questions: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
            approved_at: row.get(6)?,
            response_count: row.get(7)?,
            approver: row.get(8)?,
            form_id: row.get(9)?,
            form_url: row.get(10)?,
            edit_url: row.get(11)?,
            created_by: row.get(12)?,
        })
    }

    fn into_survey(self) -> Result<Survey, StoreError> {
        let status = self
            .status
            .parse::<SurveyStatus>()
            .map_err(|source| StoreError::Corrupt {
                id: self.id.clone(),
                source,
            })?;
        let form = match (self.form_id, self.form_url) {
            (Some(form_id), Some(form_url)) => Some(FormReference {
                edit_url: self.edit_url.unwrap_or_default(),
                form_id,
                form_url,
            }),
            _ => None,
        };
        Ok(Survey {
            id: self.id,
            title: self.title,
            description: self.description,
            questions: self.questions,
            status,
            created_at: self.created_at,
            approved_at: self.approved_at,
            response_count: self.response_count,
            approver: self.approver,
            form,
            created_by: self.created_by,
        })
    }
}

#[async_trait]
impl SurveyRepository for SqliteSurveyStore {
    async fn get(&self, id: &str) -> Result<Option<Survey>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ?1"),
                    params![id],
                    SurveyRow::read,
                )
                .optional()?;
            row.map(SurveyRow::into_survey).transpose()
        })
        .await
    }

    async fn list(
        &self,
        filter: SurveyFilter,
        skip: usize,
        limit: usize,
    ) -> Result<SurveyPage, StoreError> {
        self.with_conn(move |conn| {
            let status = filter.status.map(|s| s.as_str());

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM surveys WHERE (?1 IS NULL OR status = ?1)",
                params![status],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {SURVEY_COLUMNS} FROM surveys WHERE (?1 IS NULL OR status = ?1) \
                ORDER BY seq ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(
                params![status, sql_count(limit), sql_count(skip)],
                SurveyRow::read,
            )?;

            let mut surveys = Vec::new();
            for row in rows {
                surveys.push(row?.into_survey()?);
            }
            Ok(SurveyPage {
                surveys,
                total: total as usize,
            })
        })
        .await
    }

    async fn insert(&self, survey: Survey) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT seq FROM surveys WHERE id = ?1",
                    params![survey.id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Err(StoreError::Duplicate(survey.id));
            }

            let form = survey.form.as_ref();
            conn.execute(
                &format!(
                    "INSERT INTO surveys ({SURVEY_COLUMNS}) \
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    survey.id,
                    survey.title,
                    survey.description,
                    survey.questions,
                    survey.status.as_str(),
                    survey.created_at,
                    survey.approved_at,
                    survey.response_count,
                    survey.approver,
                    form.map(|f| f.form_id.as_str()),
                    form.map(|f| f.form_url.as_str()),
                    form.map(|f| f.edit_url.as_str()),
                    survey.created_by
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, survey: Survey) -> Result<bool, StoreError> {
        self.with_conn(move |conn| write_survey(conn, &survey, None))
            .await
    }

    async fn update_if_status(
        &self,
        survey: Survey,
        expected: SurveyStatus,
    ) -> Result<bool, StoreError> {
        self.with_conn(move |conn| write_survey(conn, &survey, Some(expected)))
            .await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM surveys WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }
}

/// Overwrites the mutable columns. With `expected` set, the row only changes
/// while its stored status still matches.
fn write_survey(
    conn: &Connection,
    survey: &Survey,
    expected: Option<SurveyStatus>,
) -> Result<bool, StoreError> {
    let form = survey.form.as_ref();
    let changed = conn.execute(
        "UPDATE surveys SET title = ?1, description = ?2, questions = ?3, status = ?4, \
        approved_at = ?5, response_count = ?6, approver = ?7, form_id = ?8, form_url = ?9, \
        edit_url = ?10 WHERE id = ?11 AND (?12 IS NULL OR status = ?12)",
        params![
            survey.title,
            survey.description,
            survey.questions,
            survey.status.as_str(),
            survey.approved_at,
            survey.response_count,
            survey.approver,
            form.map(|f| f.form_id.as_str()),
            form.map(|f| f.form_url.as_str()),
            form.map(|f| f.edit_url.as_str()),
            survey.id,
            expected.map(|s| s.as_str())
        ],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::SqliteSurveyStore;
    use crate::store::{StoreError, SurveyRepository};
    use crate::survey::types::{FormReference, Survey, SurveyFilter, SurveyStatus};
    use pretty_assertions::assert_eq;
    use rusqlite::params;

    fn survey(id: &str, status: SurveyStatus) -> Survey {
        Survey {
            id: id.to_string(),
            title: format!("Survey {id}"),
            description: "desc".to_string(),
            questions: Some("1. Why?".to_string()),
            status,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            approved_at: None,
            response_count: 3,
            approver: None,
            form: Some(FormReference {
                form_id: format!("form-{id}"),
                form_url: format!("https://docs.google.com/forms/d/e/{id}/viewform"),
                edit_url: format!("https://docs.google.com/forms/d/{id}/edit"),
            }),
            created_by: "owner@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn stores_and_reads_back_every_field() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        let original = survey("a", SurveyStatus::PendingApproval);
        store.insert(original.clone()).await.expect("insert");
        assert_eq!(store.get("a").await.expect("get"), Some(original));
        assert_eq!(store.get("missing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn filters_and_pages() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        for (id, status) in [
            ("a", SurveyStatus::Draft),
            ("b", SurveyStatus::Archived),
            ("c", SurveyStatus::Draft),
        ] {
            store.insert(survey(id, status)).await.expect("insert");
        }
        let page = store
            .list(SurveyFilter { status: Some(SurveyStatus::Draft) }, 1, 5)
            .await
            .expect("list");
        assert_eq!(page.total, 2);
        assert_eq!(
            page.surveys.iter().map(|s| s.id.as_str()).collect::<Vec<&str>>(),
            vec!["c"]
        );
    }

    #[tokio::test]
    async fn update_clears_form_and_delete_removes() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        store.insert(survey("a", SurveyStatus::Draft)).await.expect("insert");

        let mut changed = survey("a", SurveyStatus::Approved);
        changed.form = None;
        changed.approver = Some("Ada".to_string());
        assert!(store.update(changed.clone()).await.expect("update"));
        assert_eq!(store.get("a").await.expect("get"), Some(changed));

        assert!(store.delete("a").await.expect("delete"));
        assert!(!store.delete("a").await.expect("delete"));
    }

    #[tokio::test]
    async fn unknown_stored_status_is_reported_as_corruption() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        store.insert(survey("a", SurveyStatus::Draft)).await.expect("insert");
        store
            .lock()
            .expect("lock")
            .execute("UPDATE surveys SET status = 'published' WHERE id = ?1", params!["a"])
            .expect("corrupt");

        let err = store.get("a").await.expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { ref id, .. } if id == "a"));
    }

    #[tokio::test]
    async fn conditional_update_only_applies_to_expected_status() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        store.insert(survey("a", SurveyStatus::Draft)).await.expect("insert");

        let mut approved = survey("a", SurveyStatus::Approved);
        approved.approver = Some("Ada".to_string());
        assert!(store
            .update_if_status(approved.clone(), SurveyStatus::Draft)
            .await
            .expect("first"));

        let mut second = survey("a", SurveyStatus::Approved);
        second.approver = Some("Grace".to_string());
        assert!(!store
            .update_if_status(second, SurveyStatus::Draft)
            .await
            .expect("second"));
        assert_eq!(store.get("a").await.expect("get"), Some(approved));
    }

    #[tokio::test]
    async fn huge_skip_returns_an_empty_page() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        store.insert(survey("a", SurveyStatus::Draft)).await.expect("insert");
        let page = store
            .list(SurveyFilter::default(), usize::MAX, 10)
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert!(page.surveys.is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = SqliteSurveyStore::open_in_memory().expect("open");
        store.insert(survey("a", SurveyStatus::Draft)).await.expect("insert");
        assert!(matches!(
            store.insert(survey("a", SurveyStatus::Draft)).await,
            Err(StoreError::Duplicate(_))
        ));
    }
}
