use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::models::job::{HistoryEntry, Job};
use crate::models::role::Role;
use crate::models::status::JobStatus;

pub const TRANSITION_EVENT: &str = "job.transition";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub event: &'static str,
    pub job_id: Uuid,
    pub job_code: String,
    pub action: String,
    pub from_status: JobStatus,
    pub status: JobStatus,
    pub actor_role: Role,
    pub at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn new(job: &Job, entry: &HistoryEntry) -> Self {
        Self {
            event: TRANSITION_EVENT,
            job_id: job.id,
            job_code: job.job_id.clone(),
            action: entry.action.clone(),
            from_status: entry.from_status,
            status: entry.status,
            actor_role: entry.actor_role,
            at: entry.at,
        }
    }
}

/// Fire-and-forget webhook for committed transitions. Delivery runs on a
/// spawned task; failures are logged and never reach the caller.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    target_url: Option<String>,
}

impl NotificationService {
    pub fn new(client: Client, target_url: Option<String>) -> Self {
        Self { client, target_url }
    }

    pub fn disabled() -> Self {
        Self::new(Client::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.target_url.is_some()
    }

    pub fn job_transitioned(&self, job: &Job, entry: &HistoryEntry) {
        let Some(url) = self.target_url.clone() else {
            return;
        };
        let event = TransitionEvent::new(job, entry);
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&event).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(job_id = %event.job_id, action = %event.action, "Transition webhook delivered");
                }
                Ok(resp) => {
                    tracing::warn!(
                        job_id = %event.job_id,
                        status = %resp.status(),
                        "Transition webhook rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(job_id = %event.job_id, error = %e, "Transition webhook failed");
                }
            }
        });
    }
}
