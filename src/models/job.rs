use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::document::{Document, FileRef};
use super::invoice::{Invoice, InvoiceChange};
use super::role::Role;
use super::status::JobStatus;
use crate::error::{Error, Result};

pub const MIN_MKTU_CLASS: i64 = 1;
pub const MAX_MKTU_CLASS: i64 = 45;

/// Nice classification classes of a brand. Duplicates collapse and the set
/// always serializes in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u8>")]
pub struct MktuClasses(BTreeSet<u8>);

impl MktuClasses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.iter().copied().collect()
    }
}

impl TryFrom<Vec<i64>> for MktuClasses {
    type Error = Error;

    fn try_from(raw: Vec<i64>) -> Result<Self> {
        let mut set = BTreeSet::new();
        for class in raw {
            if !(MIN_MKTU_CLASS..=MAX_MKTU_CLASS).contains(&class) {
                return Err(Error::validation(
                    "classes",
                    format!(
                        "class {} is outside {}..{}",
                        class, MIN_MKTU_CLASS, MAX_MKTU_CLASS
                    ),
                ));
            }
            set.insert(class as u8);
        }
        Ok(Self(set))
    }
}

impl From<MktuClasses> for Vec<u8> {
    fn from(classes: MktuClasses) -> Self {
        classes.to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    Yuridik,
    Jismoniy,
}

/// Document bundle of a legal entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YuridikDocs {
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub stir: Option<String>,
    pub oked: Option<String>,
    pub account_number: Option<String>,
    pub bank_info: Option<String>,
    pub mfo: Option<String>,
    pub logo: Option<FileRef>,
    pub patent_brand_name: Option<String>,
    pub director_passport_image: Option<FileRef>,
}

/// Document bundle of a natural person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JismoniyDocs {
    pub passport_image_front: Option<FileRef>,
    pub passport_image_back: Option<FileRef>,
    pub full_brand_name: Option<String>,
    pub full_address: Option<String>,
}

/// The one active document bundle, selected by `personType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "personType", content = "docs", rename_all = "lowercase")]
pub enum PersonDocs {
    Yuridik(YuridikDocs),
    Jismoniy(JismoniyDocs),
}

impl PersonDocs {
    pub fn person_type(&self) -> PersonType {
        match self {
            PersonDocs::Yuridik(_) => PersonType::Yuridik,
            PersonDocs::Jismoniy(_) => PersonType::Jismoniy,
        }
    }

    /// Uploaded files referenced by the bundle, keyed by field name.
    pub fn file_refs(&self) -> Vec<(&'static str, &FileRef)> {
        let fields = match self {
            PersonDocs::Yuridik(d) => [
                ("logo", &d.logo),
                ("directorPassportImage", &d.director_passport_image),
            ],
            PersonDocs::Jismoniy(d) => [
                ("passportImageFront", &d.passport_image_front),
                ("passportImageBack", &d.passport_image_back),
            ],
        };
        fields
            .into_iter()
            .filter_map(|(field, file)| file.as_ref().map(|f| (field, f)))
            .collect()
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            PersonDocs::Yuridik(d) => d.company_address.as_deref(),
            PersonDocs::Jismoniy(d) => d.full_address.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub action: String,
    pub actor_role: Role,
    pub actor_id: Option<String>,
    pub from_status: JobStatus,
    pub status: JobStatus,
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub job_id: String,
    pub client_name: String,
    pub client_surname: Option<String>,
    pub phone: Option<String>,
    pub brand_name: Option<String>,
    #[serde(default)]
    pub classes: MktuClasses,
    pub person_docs: Option<PersonDocs>,
    pub status: JobStatus,
    pub version: i64,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub comments: Option<String>,
    pub future_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly captured job: status `yangi`, empty history.
    pub fn new(new_job: NewJob, job_code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id: job_code,
            client_name: new_job.client_name,
            client_surname: new_job.client_surname,
            phone: new_job.phone,
            brand_name: new_job.brand_name,
            classes: MktuClasses::default(),
            person_docs: None,
            status: JobStatus::Yangi,
            version: 0,
            documents: Vec::new(),
            invoices: Vec::new(),
            history: Vec::new(),
            comments: new_job.comments,
            future_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn client_full_name(&self) -> String {
        match self.client_surname.as_deref().map(str::trim) {
            Some(surname) if !surname.is_empty() => format!("{} {}", self.client_name, surname),
            _ => self.client_name.clone(),
        }
    }

    pub fn invoice(&self, invoice_id: Uuid) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == invoice_id)
    }

    pub fn is_paid(&self) -> bool {
        self.invoices
            .iter()
            .any(|i| i.status == super::invoice::InvoiceStatus::Paid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub client_name: String,
    pub client_surname: Option<String>,
    pub phone: Option<String>,
    pub brand_name: Option<String>,
    pub comments: Option<String>,
}

/// Shallow field merge. `None` leaves the stored value untouched; history
/// and documents are not reachable from here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub brand_name: Option<String>,
    pub classes: Option<MktuClasses>,
    pub person_docs: Option<PersonDocs>,
    pub comments: Option<String>,
    pub future_date: Option<NaiveDate>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        *self == JobPatch::default()
    }

    fn apply_to(&self, job: &mut Job) {
        if let Some(brand_name) = &self.brand_name {
            job.brand_name = Some(brand_name.clone());
        }
        if let Some(classes) = &self.classes {
            job.classes = classes.clone();
        }
        if let Some(docs) = &self.person_docs {
            job.person_docs = Some(docs.clone());
        }
        if let Some(comments) = &self.comments {
            job.comments = Some(comments.clone());
        }
        if self.future_date.is_some() {
            job.future_date = self.future_date;
        }
    }
}

/// Everything one commit changes on a job. Stores apply it atomically under
/// a compare-and-swap on the expected status and version.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub patch: JobPatch,
    pub history: Option<HistoryEntry>,
    pub new_documents: Vec<Document>,
    pub new_invoice: Option<Invoice>,
    pub invoice_change: Option<InvoiceChange>,
}

impl JobUpdate {
    pub fn apply_to(&self, job: &mut Job, now: DateTime<Utc>) -> Result<()> {
        if let Some(change) = &self.invoice_change {
            let invoice = job
                .invoices
                .iter_mut()
                .find(|i| i.id == change.invoice_id)
                .ok_or_else(|| Error::NotFound(format!("Invoice {} not found", change.invoice_id)))?;
            change.apply_to(invoice);
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        self.patch.apply_to(job);
        if let Some(invoice) = &self.new_invoice {
            job.invoices.push(invoice.clone());
        }
        job.documents.extend(self.new_documents.iter().cloned());
        if let Some(entry) = &self.history {
            job.history.push(entry.clone());
        }
        job.version += 1;
        job.updated_at = now;
        Ok(())
    }
}

/// Compare-and-swap expectation for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub status: JobStatus,
    pub version: i64,
}

impl Expected {
    pub fn of(job: &Job) -> Self {
        Self {
            status: job.status,
            version: job.version,
        }
    }
}
