//! Side-effect-free checks run before a transition is committed. Each guard
//! either passes (returning any normalized value the transition needs) or
//! fails with an error naming the offending field or the current status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::actions::{ActionKind, ClientIntent};
use super::invoice;
use crate::error::{Error, Result};
use crate::models::document::FileRef;
use crate::models::invoice::InvoiceStatus;
use crate::models::job::{Job, MktuClasses, PersonDocs};

/// Fails unless the job's status is one the action may start from.
pub fn ensure_state(job: &Job, kind: ActionKind) -> Result<()> {
    if kind.is_legal_from(job.status) {
        return Ok(());
    }
    let expected = kind
        .allowed_from()
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::invalid_state(
        job.status,
        format!(
            "{} is not allowed while job is {} (expected one of: {})",
            kind.name(),
            job.status,
            expected
        ),
    ))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require_file<'a>(file: Option<&'a FileRef>, field: &str, message: &str) -> Result<&'a FileRef> {
    file.filter(|f| !f.is_blank())
        .ok_or_else(|| Error::validation(field, message))
}

pub fn can_record_client_intent(
    intent: ClientIntent,
    future_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<()> {
    if intent == ClientIntent::Later {
        let date = future_date.ok_or_else(|| Error::validation("futureDate", "date required"))?;
        if date < today {
            return Err(Error::validation("futureDate", "date must not be in the past"));
        }
    }
    Ok(())
}

pub fn can_send_for_review(brand_name: &str, classes: &[i64]) -> Result<MktuClasses> {
    if brand_name.trim().is_empty() {
        return Err(Error::validation("brandName", "brand name required"));
    }
    if classes.is_empty() {
        return Err(Error::validation("classes", "at least one class required"));
    }
    MktuClasses::try_from(classes.to_vec())
}

/// Returns the class override to store, if the reviewer sent one.
pub fn can_review_brand(
    job: &Job,
    approved: bool,
    reason: Option<&str>,
    classes: Option<&[i64]>,
) -> Result<Option<MktuClasses>> {
    ensure_state(job, ActionKind::ReviewBrand)?;
    let override_classes = classes
        .map(|c| MktuClasses::try_from(c.to_vec()))
        .transpose()?;
    if approved {
        let effective = override_classes.as_ref().unwrap_or(&job.classes);
        if effective.is_empty() {
            return Err(Error::validation("classes", "at least one class required"));
        }
    } else if non_blank(reason).is_none() {
        return Err(Error::validation("reason", "rejection reason required"));
    }
    Ok(override_classes)
}

/// Checks the bundle holds every field the registration filing needs.
pub fn check_person_docs(docs: &PersonDocs) -> Result<()> {
    match docs {
        PersonDocs::Yuridik(d) => {
            let required = [
                ("companyName", d.company_name.as_deref()),
                ("companyAddress", d.company_address.as_deref()),
                ("stir", d.stir.as_deref()),
            ];
            for (field, value) in required {
                if non_blank(value).is_none() {
                    return Err(Error::validation(field, format!("{} is required", field)));
                }
            }
        }
        PersonDocs::Jismoniy(d) => {
            require_file(
                d.passport_image_front.as_ref(),
                "passportImageFront",
                "passportImageFront is required",
            )?;
            require_file(
                d.passport_image_back.as_ref(),
                "passportImageBack",
                "passportImageBack is required",
            )?;
            if non_blank(d.full_brand_name.as_deref()).is_none() {
                return Err(Error::validation("fullBrandName", "fullBrandName is required"));
            }
        }
    }
    Ok(())
}

pub fn can_submit_documents(docs: Option<&PersonDocs>) -> Result<&PersonDocs> {
    let docs = docs.ok_or_else(|| Error::validation("personType", "person type and documents required"))?;
    check_person_docs(docs)?;
    Ok(docs)
}

pub fn can_return_documents(reason: Option<&str>) -> Result<()> {
    non_blank(reason)
        .map(|_| ())
        .ok_or_else(|| Error::validation("reason", "return reason required"))
}

pub fn can_send_to_lawyer(job: &Job) -> Result<()> {
    ensure_state(job, ActionKind::SendToLawyer)
}

pub fn can_accept_by_lawyer(job: &Job) -> Result<()> {
    ensure_state(job, ActionKind::AcceptByLawyer)?;
    let incomplete = |field: Option<String>| Error::Validation {
        field,
        message: "required documents incomplete".to_string(),
    };
    match &job.person_docs {
        None => Err(incomplete(Some("personType".to_string()))),
        Some(docs) => check_person_docs(docs).map_err(|err| match err {
            Error::Validation { field, .. } => incomplete(field),
            other => other,
        }),
    }
}

pub fn can_send_invoice<'a>(
    job: &Job,
    file: Option<&'a FileRef>,
    amount: Option<Decimal>,
) -> Result<&'a FileRef> {
    ensure_state(job, ActionKind::SendInvoice)?;
    let file = require_file(file, "file", "invoice file required")?;
    if let Some(amount) = amount {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("amount", "amount must be positive"));
        }
    }
    Ok(file)
}

pub fn can_upload_receipt<'a>(
    job: &Job,
    invoice_id: Uuid,
    file: Option<&'a FileRef>,
) -> Result<&'a FileRef> {
    let invoice = invoice::find_invoice(job, invoice_id)?;
    invoice::ensure_advance(job, invoice, InvoiceStatus::ReceiptUploaded)?;
    require_file(file, "file", "receipt file required")
}

pub fn can_approve_receipt(job: &Job, invoice_id: Uuid) -> Result<()> {
    let invoice = invoice::find_invoice(job, invoice_id)?;
    invoice::ensure_advance(job, invoice, InvoiceStatus::Paid)
}

pub fn can_complete_by_lawyer<'a>(
    job: &Job,
    certificate: Option<&'a FileRef>,
    comment: Option<&str>,
) -> Result<&'a FileRef> {
    ensure_state(job, ActionKind::CompleteByLawyer)?;
    if !job.is_paid() {
        return Err(Error::invalid_state(job.status, "payment not confirmed"));
    }
    let certificate = require_file(certificate, "certificateFile", "certificate file required")?;
    if non_blank(comment).is_none() {
        return Err(Error::validation("comment", "comment required"));
    }
    Ok(certificate)
}

/// The power of attorney needs a brand with classes and a document bundle
/// to take the address from.
pub fn can_generate_power_of_attorney(job: &Job) -> Result<()> {
    ensure_state(job, ActionKind::GeneratePowerOfAttorney)?;
    if non_blank(job.brand_name.as_deref()).is_none() {
        return Err(Error::validation("brandName", "brand name required"));
    }
    if job.classes.is_empty() {
        return Err(Error::validation("classes", "at least one class required"));
    }
    if job.person_docs.is_none() {
        return Err(Error::validation("personType", "person type and documents required"));
    }
    Ok(())
}
