use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::job::{Job, PersonDocs, PersonType};
use crate::utils::time::format_document_date;

/// Structured fields handed to the power-of-attorney template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerOfAttorneyFields {
    pub client_full_name: String,
    pub brand_name: String,
    pub classes: Vec<u8>,
    pub date: String,
    pub address: Option<String>,
    pub person_type: PersonType,
    pub company_name: Option<String>,
    pub stir: Option<String>,
}

impl PowerOfAttorneyFields {
    pub fn from_job(job: &Job, date: NaiveDate) -> Result<Self> {
        let docs = job
            .person_docs
            .as_ref()
            .ok_or_else(|| Error::validation("personDocs", "documents have not been submitted"))?;
        let brand_name = job
            .brand_name
            .clone()
            .ok_or_else(|| Error::validation("brandName", "brand name required"))?;

        let (company_name, stir) = match docs {
            PersonDocs::Yuridik(d) => (d.company_name.clone(), d.stir.clone()),
            PersonDocs::Jismoniy(_) => (None, None),
        };

        Ok(Self {
            client_full_name: job.client_full_name(),
            brand_name,
            classes: job.classes.to_vec(),
            date: format_document_date(date),
            address: docs.address().map(str::to_string),
            person_type: docs.person_type(),
            company_name,
            stir,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// File extension the bytes should be stored under.
    pub extension: &'static str,
}

/// Template rendering collaborator for generated legal documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, fields: &PowerOfAttorneyFields) -> Result<RenderedDocument>;
}

/// Posts the fields to an external template service and keeps whatever
/// PDF or DOCX it returns.
#[derive(Clone)]
pub struct HttpDocumentRenderer {
    client: Client,
    url: String,
}

impl HttpDocumentRenderer {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl DocumentRenderer for HttpDocumentRenderer {
    async fn render(&self, fields: &PowerOfAttorneyFields) -> Result<RenderedDocument> {
        let resp = self.client.post(&self.url).json(fields).send().await?;
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), url = %self.url, "Document renderer refused request");
            return Err(Error::Storage(format!(
                "document renderer returned {}",
                resp.status()
            )));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let extension = if content_type.starts_with("application/pdf") {
            "pdf"
        } else if content_type.contains("wordprocessingml") {
            "docx"
        } else {
            return Err(Error::Storage(format!(
                "document renderer returned unsupported content type '{}'",
                content_type
            )));
        };
        let bytes = resp.bytes().await?;
        Ok(RenderedDocument {
            bytes: bytes.to_vec(),
            extension,
        })
    }
}

/// Fallback when no renderer is configured: the fields themselves are kept
/// as a JSON document so a template can be applied later.
#[derive(Clone, Default)]
pub struct JsonDocumentRenderer;

#[async_trait]
impl DocumentRenderer for JsonDocumentRenderer {
    async fn render(&self, fields: &PowerOfAttorneyFields) -> Result<RenderedDocument> {
        Ok(RenderedDocument {
            bytes: serde_json::to_vec_pretty(fields)?,
            extension: "json",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{MktuClasses, NewJob, YuridikDocs};
    use chrono::Utc;

    fn job_with_docs() -> Job {
        let mut job = Job::new(
            NewJob {
                client_name: "Akmal".into(),
                client_surname: Some("Karimov".into()),
                brand_name: Some("Akmal Tea".into()),
                ..Default::default()
            },
            "TM-DOC00001".into(),
            Utc::now(),
        );
        job.classes = MktuClasses::try_from(vec![35_i64, 30]).unwrap();
        job.person_docs = Some(PersonDocs::Yuridik(YuridikDocs {
            company_name: Some("Akmal Tea MChJ".into()),
            company_address: Some("Toshkent, Chilonzor 5".into()),
            stir: Some("301234567".into()),
            ..Default::default()
        }));
        job
    }

    #[test]
    fn fields_come_from_the_job() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let fields = PowerOfAttorneyFields::from_job(&job_with_docs(), date).unwrap();
        assert_eq!(fields.client_full_name, "Akmal Karimov");
        assert_eq!(fields.classes, vec![30, 35]);
        assert_eq!(fields.date, "15.10.2026");
        assert_eq!(fields.address.as_deref(), Some("Toshkent, Chilonzor 5"));
        assert_eq!(fields.stir.as_deref(), Some("301234567"));
    }

    #[test]
    fn fields_need_submitted_documents() {
        let mut job = job_with_docs();
        job.person_docs = None;
        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert!(PowerOfAttorneyFields::from_job(&job, date).is_err());
    }

    #[tokio::test]
    async fn json_renderer_keeps_the_fields() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let fields = PowerOfAttorneyFields::from_job(&job_with_docs(), date).unwrap();
        let rendered = JsonDocumentRenderer.render(&fields).await.unwrap();
        assert_eq!(rendered.extension, "json");
        let value: serde_json::Value = serde_json::from_slice(&rendered.bytes).unwrap();
        assert_eq!(value["brandName"], "Akmal Tea");
        assert_eq!(value["personType"], "yuridik");
    }
}
