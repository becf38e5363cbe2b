use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::job_store::JobStore;
use crate::error::{Error, Result};
use crate::models::document::{Document, DocumentType};
use crate::models::job::{Expected, Job, JobUpdate, NewJob};
use crate::models::role::{Actor, Role};
use crate::models::status::Stage;
use crate::services::document_service::{DocumentRenderer, PowerOfAttorneyFields};
use crate::services::file_storage_service::FileStorageService;
use crate::services::notification_service::NotificationService;
use crate::utils::time::now;
use crate::utils::token::generate_job_code;
use crate::workflow::transitions::{next_actions, plan};
use crate::workflow::{ActionKind, JobAction};

const JOB_CODE_ATTEMPTS: usize = 3;

/// A job as seen by one role: the record plus the server-computed step and
/// the actions that role may take next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job: Job,
    pub current_step: Stage,
    pub next_actions: Vec<ActionKind>,
}

impl JobView {
    pub fn for_role(job: Job, role: Role) -> Self {
        Self {
            current_step: job.status.stage(),
            next_actions: next_actions(&job, role),
            job,
        }
    }
}

/// The only writer of job records. Every action is one load, one plan and
/// one compare-and-swap commit.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    files: FileStorageService,
    renderer: Arc<dyn DocumentRenderer>,
    notifier: NotificationService,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        files: FileStorageService,
        renderer: Arc<dyn DocumentRenderer>,
        notifier: NotificationService,
    ) -> Self {
        Self {
            store,
            files,
            renderer,
            notifier,
        }
    }

    pub async fn create_job(&self, actor: &Actor, new_job: NewJob) -> Result<JobView> {
        if !matches!(actor.role, Role::Operator | Role::Admin) {
            return Err(Error::Forbidden(format!(
                "role '{}' may not create jobs",
                actor.role
            )));
        }
        if new_job.client_name.trim().is_empty() {
            return Err(Error::validation("clientName", "client name required"));
        }

        let mut attempt = 0;
        let job = loop {
            attempt += 1;
            let job = Job::new(new_job.clone(), generate_job_code(), now());
            match self.store.insert(job).await {
                Ok(job) => break job,
                Err(Error::Conflict(msg)) if attempt < JOB_CODE_ATTEMPTS => {
                    warn!(%msg, "Job code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        };

        info!(job_id = %job.id, job_code = %job.job_id, actor_role = %actor.role, "Job created");
        Ok(JobView::for_role(job, actor.role))
    }

    pub async fn get_job(&self, actor: &Actor, id: Uuid) -> Result<JobView> {
        let job = self.store.get(id).await?;
        Ok(JobView::for_role(job, actor.role))
    }

    /// Runs `action` on job `id`. When `expected_version` is given the call
    /// fails with a conflict unless the job is still at that version.
    pub async fn execute(
        &self,
        actor: &Actor,
        id: Uuid,
        action: JobAction,
        expected_version: Option<i64>,
    ) -> Result<JobView> {
        let kind = action.kind();
        let job = self.store.get(id).await?;
        if let Some(version) = expected_version {
            if version != job.version {
                return Err(Error::Conflict(format!(
                    "job {} is at version {}, not {}",
                    job.id, job.version, version
                )));
            }
        }

        let at = now();
        let mut update = plan(&job, &action, actor, at)?;

        for (field, file) in action.file_refs() {
            self.files.ensure_exists(field, file).await?;
        }
        if kind == ActionKind::GeneratePowerOfAttorney {
            let document = self.render_power_of_attorney(&job, at).await?;
            update.new_documents.push(document);
        }

        let entry = update.history.clone();
        let updated = self.commit(&job, update).await?;
        info!(
            job_id = %updated.id,
            action = kind.name(),
            from = %job.status,
            to = %updated.status,
            actor_role = %actor.role,
            version = updated.version,
            "Job transition committed"
        );
        if let Some(entry) = &entry {
            self.notifier.job_transitioned(&updated, entry);
        }
        Ok(JobView::for_role(updated, actor.role))
    }

    async fn render_power_of_attorney(
        &self,
        job: &Job,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Document> {
        let fields = PowerOfAttorneyFields::from_job(job, at.date_naive())?;
        let rendered = self.renderer.render(&fields).await.map_err(|e| {
            warn!(job_id = %job.id, error = %e, "Power of attorney rendering failed");
            match e {
                Error::Storage(_) => e,
                other => Error::Storage(format!("document rendering failed: {}", other)),
            }
        })?;
        let filename = format!("power-of-attorney.{}", rendered.extension);
        let stored = self.files.save(&filename, &rendered.bytes).await?;
        Ok(Document::new(DocumentType::PowerOfAttorney, stored.path, at))
    }

    async fn commit(&self, job: &Job, update: JobUpdate) -> Result<Job> {
        self.store
            .apply(job.id, Expected::of(job), update)
            .await
            .map_err(|e| {
                if matches!(e, Error::Database(_) | Error::Storage(_)) {
                    error!(job_id = %job.id, error = %e, "Failed to commit job update");
                }
                e
            })
    }
}
