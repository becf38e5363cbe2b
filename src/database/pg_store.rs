use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::job_store::{JobFilter, JobStore};
use crate::error::{Error, Result};
use crate::models::document::Document;
use crate::models::invoice::Invoice;
use crate::models::job::{Expected, HistoryEntry, Job, JobUpdate, MktuClasses, PersonDocs};
use crate::models::status::JobStatus;
use crate::utils::time::now;

const UNIQUE_VIOLATION: &str = "23505";

const JOB_COLUMNS: &str = r#"
    id, job_code, status, version, client_name, client_surname, phone, brand_name,
    classes, person_docs, documents, invoices, history, comments, future_date,
    created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    job_code: String,
    status: String,
    version: i64,
    client_name: String,
    client_surname: Option<String>,
    phone: Option<String>,
    brand_name: Option<String>,
    classes: Vec<i32>,
    person_docs: Option<Json<PersonDocs>>,
    documents: Json<Vec<Document>>,
    invoices: Json<Vec<Invoice>>,
    history: Json<Vec<HistoryEntry>>,
    comments: Option<String>,
    future_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = Error;

    fn try_from(row: JobRow) -> Result<Self> {
        let status = row.status.parse::<JobStatus>().map_err(|_| {
            Error::Internal(format!("job {} has unknown status '{}'", row.id, row.status))
        })?;
        let classes = MktuClasses::try_from(row.classes.into_iter().map(i64::from).collect::<Vec<_>>())
            .map_err(|e| Error::Internal(format!("job {} has invalid classes: {}", row.id, e)))?;
        Ok(Job {
            id: row.id,
            job_id: row.job_code,
            client_name: row.client_name,
            client_surname: row.client_surname,
            phone: row.phone,
            brand_name: row.brand_name,
            classes,
            person_docs: row.person_docs.map(|Json(docs)| docs),
            status,
            version: row.version,
            documents: row.documents.0,
            invoices: row.invoices.0,
            history: row.history.0,
            comments: row.comments,
            future_date: row.future_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn class_column(classes: &MktuClasses) -> Vec<i32> {
    classes.iter().map(i32::from).collect()
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: Job) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO jobs (
                id, job_code, status, version, client_name, client_surname, phone, brand_name,
                classes, person_docs, documents, invoices, history, comments, future_date,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job.id)
        .bind(&job.job_id)
        .bind(job.status.as_str())
        .bind(job.version)
        .bind(&job.client_name)
        .bind(&job.client_surname)
        .bind(&job.phone)
        .bind(&job.brand_name)
        .bind(class_column(&job.classes))
        .bind(job.person_docs.as_ref().map(Json))
        .bind(Json(&job.documents))
        .bind(Json(&job.invoices))
        .bind(Json(&job.history))
        .bind(&job.comments)
        .bind(job.future_date)
        .bind(job.created_at)
        .bind(job.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))?;
        row.try_into()
    }

    async fn list_by_status(&self, statuses: &[JobStatus], filter: &JobFilter) -> Result<Vec<Job>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let search = filter.search_term().map(|term| format!("%{}%", term));
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {}
            FROM jobs
            WHERE status = ANY($1)
              AND ($2::text IS NULL
                   OR LOWER(client_name) LIKE $2
                   OR LOWER(COALESCE(client_surname, '')) LIKE $2
                   OR LOWER(COALESCE(brand_name, '')) LIKE $2
                   OR LOWER(job_code) LIKE $2
                   OR LOWER(COALESCE(phone, '')) LIKE $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
            ORDER BY updated_at DESC, id ASC
            "#,
            JOB_COLUMNS
        ))
        .bind(statuses)
        .bind(search)
        .bind(filter.created_from())
        .bind(filter.created_before())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn apply(&self, id: Uuid, expected: Expected, update: JobUpdate) -> Result<Job> {
        let current = self.get(id).await?;
        if current.status != expected.status || current.version != expected.version {
            return Err(Error::Conflict(format!(
                "job {} changed concurrently (now {} v{}, expected {} v{})",
                id, current.status, current.version, expected.status, expected.version
            )));
        }

        let mut next = current.clone();
        update.apply_to(&mut next, now())?;
        let appended_history: Vec<HistoryEntry> = update.history.iter().cloned().collect();

        // History and documents are appended in SQL so a stale snapshot can
        // never overwrite them; the status/version predicate makes the whole
        // statement a compare-and-swap.
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs
            SET status = $4,
                version = version + 1,
                brand_name = $5,
                classes = $6,
                person_docs = $7,
                comments = $8,
                future_date = $9,
                invoices = $10,
                documents = documents || $11,
                history = history || $12,
                updated_at = $13
            WHERE id = $1 AND status = $2 AND version = $3
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(expected.status.as_str())
        .bind(expected.version)
        .bind(next.status.as_str())
        .bind(&next.brand_name)
        .bind(class_column(&next.classes))
        .bind(next.person_docs.as_ref().map(Json))
        .bind(&next.comments)
        .bind(next.future_date)
        .bind(Json(&next.invoices))
        .bind(Json(&update.new_documents))
        .bind(Json(&appended_history))
        .bind(next.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(Error::Conflict(format!(
                "job {} changed concurrently while committing",
                id
            ))),
        }
    }

    async fn status_counts(&self) -> Result<HashMap<JobStatus, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = HashMap::new();
        for (status, count) in rows {
            match status.parse::<JobStatus>() {
                Ok(status) => {
                    counts.insert(status, count);
                }
                Err(_) => tracing::warn!(%status, "ignoring jobs with unknown status"),
            }
        }
        Ok(counts)
    }
}

/// A taken `job_code` is a conflict the caller may retry with a fresh code.
fn insert_error(err: sqlx::Error) -> Error {
    let unique_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if unique_violation {
        return Error::Conflict(format!("job code already taken: {}", err));
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct PgFailure {
        code: &'static str,
        message: &'static str,
    }

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.code == UNIQUE_VIOLATION {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn db_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code, message }))
    }

    #[test]
    fn duplicate_job_code_is_a_conflict() {
        let err = insert_error(db_error(
            "23505",
            "duplicate key value violates unique constraint \"jobs_job_code_key\"",
        ));
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn other_insert_failures_stay_database_errors() {
        let err = insert_error(db_error("23514", "new row violates check constraint"));
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(err.code(), "internal_error");
    }
}
