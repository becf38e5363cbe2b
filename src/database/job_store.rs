use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::invoice::{Invoice, InvoiceChange};
use crate::models::job::{Expected, HistoryEntry, Job, JobPatch, JobUpdate};
use crate::models::status::JobStatus;

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl JobFilter {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Inclusive lower bound on `createdAt`.
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.date_from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Exclusive upper bound: the start of the day after `date_to`.
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(from) = self.created_from() {
            if job.created_at < from {
                return false;
            }
        }
        if let Some(before) = self.created_before() {
            if job.created_at >= before {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => [
                Some(job.client_name.as_str()),
                job.client_surname.as_deref(),
                job.brand_name.as_deref(),
                Some(job.job_id.as_str()),
                job.phone.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&term)),
        }
    }
}

/// Persistence of jobs and everything nested in them. Every mutation goes
/// through [`JobStore::apply`], a compare-and-swap on status and version.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: Job) -> Result<Job>;

    async fn get(&self, id: Uuid) -> Result<Job>;

    /// Jobs whose status is in `statuses`, most recently updated first,
    /// ties broken by id.
    async fn list_by_status(&self, statuses: &[JobStatus], filter: &JobFilter) -> Result<Vec<Job>>;

    /// Commits `update` only if the stored job still has the expected status
    /// and version; otherwise fails with `Error::Conflict`.
    async fn apply(&self, id: Uuid, expected: Expected, update: JobUpdate) -> Result<Job>;

    async fn status_counts(&self) -> Result<HashMap<JobStatus, i64>>;

    async fn append_history(&self, id: Uuid, entry: HistoryEntry) -> Result<Job> {
        let current = self.get(id).await?;
        let update = JobUpdate {
            history: Some(entry),
            ..Default::default()
        };
        self.apply(id, Expected::of(&current), update).await
    }

    async fn update_fields(&self, id: Uuid, patch: JobPatch) -> Result<Job> {
        let current = self.get(id).await?;
        let update = JobUpdate {
            patch,
            ..Default::default()
        };
        self.apply(id, Expected::of(&current), update).await
    }

    async fn add_invoice(&self, job_id: Uuid, invoice: Invoice) -> Result<Uuid> {
        let current = self.get(job_id).await?;
        let invoice_id = invoice.id;
        let update = JobUpdate {
            new_invoice: Some(invoice),
            ..Default::default()
        };
        self.apply(job_id, Expected::of(&current), update).await?;
        Ok(invoice_id)
    }

    async fn update_invoice(&self, job_id: Uuid, change: InvoiceChange) -> Result<Job> {
        let current = self.get(job_id).await?;
        let update = JobUpdate {
            invoice_change: Some(change),
            ..Default::default()
        };
        self.apply(job_id, Expected::of(&current), update).await
    }
}

/// Shared ordering for every backend: newest update first, then by id.
pub fn sort_for_worklist(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}
