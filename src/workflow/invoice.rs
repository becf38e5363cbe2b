//! Invoice sub-workflow: `pending -> receipt_uploaded -> paid`, strictly
//! forward. Each invoice advances on its own; the job only cares whether
//! any of them reached `paid`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::document::FileRef;
use crate::models::invoice::{Invoice, InvoiceChange, InvoiceStatus};
use crate::models::job::Job;

impl InvoiceStatus {
    pub fn next(&self) -> Option<InvoiceStatus> {
        match self {
            InvoiceStatus::Pending => Some(InvoiceStatus::ReceiptUploaded),
            InvoiceStatus::ReceiptUploaded => Some(InvoiceStatus::Paid),
            InvoiceStatus::Paid => None,
        }
    }
}

pub fn create_invoice(
    file: FileRef,
    amount: Option<Decimal>,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        amount,
        file,
        status: InvoiceStatus::Pending,
        receipt: None,
        comment,
        created_at: now,
        paid_at: None,
    }
}

pub fn find_invoice(job: &Job, invoice_id: Uuid) -> Result<&Invoice> {
    job.invoice(invoice_id)
        .ok_or_else(|| Error::NotFound(format!("Invoice {} not found", invoice_id)))
}

/// Checks that `invoice` may move to `target` in one forward step.
pub fn ensure_advance(job: &Job, invoice: &Invoice, target: InvoiceStatus) -> Result<()> {
    if invoice.status.next() == Some(target) {
        return Ok(());
    }
    let expected = match target {
        InvoiceStatus::ReceiptUploaded => InvoiceStatus::Pending,
        InvoiceStatus::Paid => InvoiceStatus::ReceiptUploaded,
        InvoiceStatus::Pending => {
            return Err(Error::invalid_state(
                job.status,
                format!("invoice {} cannot return to pending", invoice.id),
            ))
        }
    };
    Err(Error::invalid_state(
        job.status,
        format!(
            "invoice {} is {}, expected {}",
            invoice.id,
            invoice.status.as_str(),
            expected.as_str()
        ),
    ))
}

pub fn receipt_change(invoice: &Invoice, receipt: FileRef, comment: Option<String>) -> InvoiceChange {
    InvoiceChange {
        invoice_id: invoice.id,
        status: InvoiceStatus::ReceiptUploaded,
        receipt: Some(receipt),
        comment,
        paid_at: None,
    }
}

pub fn payment_change(invoice: &Invoice, comment: Option<String>, now: DateTime<Utc>) -> InvoiceChange {
    InvoiceChange {
        invoice_id: invoice.id,
        status: InvoiceStatus::Paid,
        receipt: None,
        comment,
        paid_at: Some(now),
    }
}
