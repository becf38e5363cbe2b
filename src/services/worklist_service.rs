use serde::Serialize;
use std::sync::Arc;

use crate::database::job_store::{JobFilter, JobStore};
use crate::error::{Error, Result};
use crate::models::job::Job;
use crate::models::role::{Actor, Role};
use crate::models::status::JobStatus;
use crate::workflow::worklist::{resolve, sections_for, visible_statuses};
use crate::workflow::Section;

#[derive(Debug, Clone, Serialize)]
pub struct WorklistPage {
    pub items: Vec<Job>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionCount {
    pub section: Section,
    pub count: i64,
}

/// Read side of the dashboards. Status sets always come from the worklist
/// table, never from the caller.
#[derive(Clone)]
pub struct WorklistService {
    store: Arc<dyn JobStore>,
}

impl WorklistService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// The role whose dashboard is being read. Non-admins only ever see
    /// their own.
    fn target_role(actor: &Actor, role: Option<Role>) -> Result<Role> {
        match role {
            None => Ok(actor.role),
            Some(role) if role == actor.role || actor.role == Role::Admin => Ok(role),
            Some(role) => Err(Error::Forbidden(format!(
                "role '{}' may not read the {} worklist",
                actor.role, role
            ))),
        }
    }

    pub fn statuses_for(
        actor: &Actor,
        role: Option<Role>,
        section: Option<Section>,
    ) -> Result<Vec<JobStatus>> {
        let role = Self::target_role(actor, role)?;
        match section {
            Some(section) => resolve(role, section).map(<[JobStatus]>::to_vec),
            None => Ok(visible_statuses(role)),
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        role: Option<Role>,
        section: Option<Section>,
        filter: &JobFilter,
    ) -> Result<WorklistPage> {
        let statuses = Self::statuses_for(actor, role, section)?;
        let items = self.store.list_by_status(&statuses, filter).await?;
        tracing::debug!(
            actor_role = %actor.role,
            section = section.map(|s| s.as_str()).unwrap_or("all"),
            total = items.len(),
            "Worklist listed"
        );
        Ok(WorklistPage {
            total: items.len(),
            items,
        })
    }

    pub async fn section_counts(&self, actor: &Actor, role: Option<Role>) -> Result<Vec<SectionCount>> {
        let role = Self::target_role(actor, role)?;
        let counts = self.store.status_counts().await?;
        sections_for(role)
            .iter()
            .map(|section| {
                let count = resolve(role, *section)?
                    .iter()
                    .filter_map(|status| counts.get(status))
                    .sum();
                Ok(SectionCount {
                    section: *section,
                    count,
                })
            })
            .collect()
    }
}
