//! The single table deciding which statuses populate each role's tabs.
//! Dashboards ask for a (role, section) pair and never carry status lists
//! of their own.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::role::Role;
use crate::models::status::JobStatus;

use JobStatus::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Yangi,
    Jarayonda,
    Tugatilgan,
    Brend,
    KoribChiqilgan,
    Hujjatlar,
    Tolov,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Yangi => "yangi",
            Section::Jarayonda => "jarayonda",
            Section::Tugatilgan => "tugatilgan",
            Section::Brend => "brend",
            Section::KoribChiqilgan => "korib_chiqilgan",
            Section::Hujjatlar => "hujjatlar",
            Section::Tolov => "tolov",
        }
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yangi" => Ok(Section::Yangi),
            "jarayonda" => Ok(Section::Jarayonda),
            "tugatilgan" => Ok(Section::Tugatilgan),
            "brend" => Ok(Section::Brend),
            "korib_chiqilgan" => Ok(Section::KoribChiqilgan),
            "hujjatlar" => Ok(Section::Hujjatlar),
            "tolov" => Ok(Section::Tolov),
            other => Err(Error::validation("section", format!("unknown section '{}'", other))),
        }
    }
}

pub fn sections_for(role: Role) -> &'static [Section] {
    match role {
        Role::Operator | Role::Lawyer => &[Section::Yangi, Section::Jarayonda, Section::Tugatilgan],
        Role::Reviewer => &[
            Section::Brend,
            Section::KoribChiqilgan,
            Section::Hujjatlar,
            Section::Tolov,
        ],
        Role::Admin => &[],
    }
}

/// Statuses listed in `section` of `role`'s dashboard, or `None` when the
/// role has no such section.
pub fn section_statuses(role: Role, section: Section) -> Option<&'static [JobStatus]> {
    let statuses: &'static [JobStatus] = match (role, section) {
        (Role::Operator, Section::Yangi) => &[
            Yangi,
            ReturnedToOperator,
            DocumentsReturned,
            AloqaUzildi,
            Keyinroq,
        ],
        (Role::Operator, Section::Jarayonda) => &[
            Bajarilmoqda,
            BrandInReview,
            Approved,
            DocumentsPending,
            DocumentsSubmitted,
        ],
        (Role::Operator, Section::Tugatilgan) => &[
            Bajarildi,
            Finished,
            ToLawyer,
            LawyerProcessing,
            LawyerCompleted,
            Rejected,
        ],
        (Role::Reviewer, Section::Brend) => &[BrandInReview],
        (Role::Reviewer, Section::KoribChiqilgan) => {
            &[Approved, Rejected, DocumentsPending, ReturnedToOperator]
        }
        (Role::Reviewer, Section::Hujjatlar) => &[DocumentsSubmitted],
        // Receipts waiting for confirmation live on lawyer-stage jobs.
        (Role::Reviewer, Section::Tolov) => &[LawyerProcessing],
        (Role::Lawyer, Section::Yangi) => &[ToLawyer],
        (Role::Lawyer, Section::Jarayonda) => &[LawyerProcessing],
        (Role::Lawyer, Section::Tugatilgan) => &[LawyerCompleted, Finished],
        _ => return None,
    };
    Some(statuses)
}

pub fn resolve(role: Role, section: Section) -> Result<&'static [JobStatus]> {
    section_statuses(role, section).ok_or_else(|| {
        Error::validation(
            "section",
            format!("role '{}' has no '{}' section", role, section.as_str()),
        )
    })
}

/// Every status shown somewhere on `role`'s dashboard.
pub fn visible_statuses(role: Role) -> Vec<JobStatus> {
    if role == Role::Admin {
        return JobStatus::ALL.to_vec();
    }
    sections_for(role)
        .iter()
        .filter_map(|section| section_statuses(role, *section))
        .flat_map(|statuses| statuses.iter().copied())
        .collect()
}
