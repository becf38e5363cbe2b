use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::job_store::{sort_for_worklist, JobFilter, JobStore};
use crate::error::{Error, Result};
use crate::models::job::{Expected, Job, JobUpdate};
use crate::models::status::JobStatus;
use crate::utils::time::now;

/// In-process store. Commits run under the write lock, so the
/// compare-and-swap is exact.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: Job) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        if jobs.values().any(|j| j.job_id == job.job_id) {
            return Err(Error::Conflict(format!("job code {} already exists", job.job_id)));
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    async fn list_by_status(&self, statuses: &[JobStatus], filter: &JobFilter) -> Result<Vec<Job>> {
        let mut items: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| statuses.contains(&job.status) && filter.matches(job))
            .cloned()
            .collect();
        sort_for_worklist(&mut items);
        Ok(items)
    }

    async fn apply(&self, id: Uuid, expected: Expected, update: JobUpdate) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))?;
        if stored.status != expected.status || stored.version != expected.version {
            return Err(Error::Conflict(format!(
                "job {} changed concurrently (now {} v{}, expected {} v{})",
                id, stored.status, stored.version, expected.status, expected.version
            )));
        }
        let mut next = stored.clone();
        update.apply_to(&mut next, now())?;
        *stored = next.clone();
        Ok(next)
    }

    async fn status_counts(&self) -> Result<HashMap<JobStatus, i64>> {
        let mut counts = HashMap::new();
        for job in self.jobs.read().await.values() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{HistoryEntry, JobPatch, NewJob};
    use crate::models::role::Role;
    use chrono::{Duration, Utc};

    fn new_job(name: &str, code: &str) -> Job {
        Job::new(
            NewJob {
                client_name: name.into(),
                brand_name: Some(format!("{} brand", name)),
                ..Default::default()
            },
            code.into(),
            Utc::now(),
        )
    }

    fn entry(to: JobStatus) -> HistoryEntry {
        HistoryEntry {
            action: "recordCallOutcome".into(),
            actor_role: Role::Operator,
            actor_id: None,
            from_status: JobStatus::Yangi,
            status: to,
            comment: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict_and_changes_nothing() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Akmal", "TM-MEM00001")).await.unwrap();
        let expected = Expected::of(&job);

        let first = JobUpdate {
            status: Some(JobStatus::AloqaUzildi),
            history: Some(entry(JobStatus::AloqaUzildi)),
            ..Default::default()
        };
        let second = JobUpdate {
            status: Some(JobStatus::Bajarilmoqda),
            history: Some(entry(JobStatus::Bajarilmoqda)),
            ..Default::default()
        };

        store.apply(job.id, expected, first).await.unwrap();
        let err = store.apply(job.id, expected, second).await.unwrap_err();
        assert_eq!(err.code(), "conflict");

        let stored = store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::AloqaUzildi);
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn field_update_keeps_history() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Akmal", "TM-MEM00002")).await.unwrap();
        store.append_history(job.id, entry(JobStatus::Yangi)).await.unwrap();
        let updated = store
            .update_fields(
                job.id,
                JobPatch {
                    comments: Some("call after 5pm".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.comments.as_deref(), Some("call after 5pm"));
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn list_filters_by_status_search_and_date() {
        let store = MemoryJobStore::new();
        let mut old = new_job("Dilshod", "TM-MEM00003");
        old.created_at = Utc::now() - Duration::days(10);
        store.insert(old).await.unwrap();
        store.insert(new_job("Akmal", "TM-MEM00004")).await.unwrap();

        let all = store
            .list_by_status(&[JobStatus::Yangi], &JobFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let searched = store
            .list_by_status(
                &[JobStatus::Yangi],
                &JobFilter {
                    search: Some("akmal BR".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].client_name, "Akmal");

        let recent = store
            .list_by_status(
                &[JobStatus::Yangi],
                &JobFilter {
                    date_from: Some(Utc::now().date_naive() - Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);

        let none = store
            .list_by_status(&[JobStatus::Finished], &JobFilter::default())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn missing_job_is_not_found() {
        let store = MemoryJobStore::new();
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap_err().code(), "not_found");
    }
}
