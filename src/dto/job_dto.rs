use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::database::job_store::JobFilter;
use crate::error::{Error, Result};
use crate::models::document::FileRef;
use crate::models::job::{JismoniyDocs, NewJob, PersonDocs, PersonType, YuridikDocs};
use crate::models::role::Role;
use crate::utils::time::parse_date;
use crate::utils::validation::non_blank;
use crate::workflow::{ClientIntent, JobAction, Section};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[validate(length(max = 200))]
    pub client_surname: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub brand_name: Option<String>,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

impl From<CreateJobPayload> for NewJob {
    fn from(p: CreateJobPayload) -> Self {
        NewJob {
            client_name: p.client_name.trim().to_string(),
            client_surname: non_blank(p.client_surname),
            phone: non_blank(p.phone),
            brand_name: non_blank(p.brand_name),
            comments: non_blank(p.comments),
        }
    }
}

/// Body of the actions that carry nothing but an optional note.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcomePayload {
    pub reached: bool,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl CallOutcomePayload {
    pub fn into_action(self) -> JobAction {
        JobAction::RecordCallOutcome {
            reached: self.reached,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientIntentPayload {
    pub intent: ClientIntent,
    pub future_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl ClientIntentPayload {
    pub fn into_action(self) -> JobAction {
        JobAction::RecordClientIntent {
            intent: self.intent,
            future_date: self.future_date,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendForReviewPayload {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub brand_name: String,
    #[serde(default)]
    pub classes: Vec<i64>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl SendForReviewPayload {
    pub fn into_action(self) -> JobAction {
        JobAction::SendForReview {
            brand_name: self.brand_name,
            classes: self.classes,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBrandPayload {
    pub approved: bool,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    pub classes: Option<Vec<i64>>,
    pub expected_version: Option<i64>,
}

impl ReviewBrandPayload {
    pub fn into_action(self) -> JobAction {
        JobAction::ReviewBrand {
            approved: self.approved,
            reason: self.reason,
            classes: self.classes,
        }
    }
}

/// `docs` is interpreted according to `personType`; the other bundle is
/// never stored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDocumentsPayload {
    pub person_type: Option<PersonType>,
    #[serde(default)]
    pub docs: JsonValue,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl SubmitDocumentsPayload {
    pub fn into_action(self) -> Result<JobAction> {
        let docs = match self.person_type {
            None => None,
            Some(person_type) => {
                let raw = if self.docs.is_null() {
                    JsonValue::Object(Default::default())
                } else {
                    self.docs
                };
                let docs = match person_type {
                    PersonType::Yuridik => serde_json::from_value::<YuridikDocs>(raw).map(PersonDocs::Yuridik),
                    PersonType::Jismoniy => serde_json::from_value::<JismoniyDocs>(raw).map(PersonDocs::Jismoniy),
                }
                .map_err(|e| Error::validation("docs", format!("invalid documents: {}", e)))?;
                Some(docs)
            }
        };
        Ok(JobAction::SubmitDocuments {
            docs,
            comment: self.comment,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReturnDocumentsPayload {
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoicePayload {
    pub file: Option<FileRef>,
    pub amount: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl SendInvoicePayload {
    pub fn into_action(self) -> JobAction {
        JobAction::SendInvoice {
            file: self.file,
            amount: self.amount,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptPayload {
    pub file: Option<FileRef>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl UploadReceiptPayload {
    pub fn into_action(self, invoice_id: Uuid) -> JobAction {
        JobAction::UploadReceipt {
            invoice_id,
            file: self.file,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub certificate_file: Option<FileRef>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub expected_version: Option<i64>,
}

impl CompletePayload {
    pub fn into_action(self) -> JobAction {
        JobAction::CompleteByLawyer {
            certificate: self.certificate_file,
            comment: self.comment,
        }
    }
}

/// Query string of the worklist, counts and export endpoints. Kept as raw
/// strings so bad values come back as field-level validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklistQuery {
    pub role: Option<String>,
    pub section: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl WorklistQuery {
    pub fn role(&self) -> Result<Option<Role>> {
        non_blank(self.role.clone())
            .map(|r| r.parse::<Role>())
            .transpose()
    }

    pub fn section(&self) -> Result<Option<Section>> {
        non_blank(self.section.clone())
            .map(|s| s.parse::<Section>())
            .transpose()
    }

    pub fn filter(&self) -> Result<JobFilter> {
        let date_from = non_blank(self.date_from.clone())
            .map(|d| parse_date("dateFrom", &d))
            .transpose()?;
        let date_to = non_blank(self.date_to.clone())
            .map(|d| parse_date("dateTo", &d))
            .transpose()?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(Error::validation("dateTo", "dateTo is before dateFrom"));
            }
        }
        Ok(JobFilter {
            search: non_blank(self.search.clone()),
            date_from,
            date_to,
        })
    }
}
