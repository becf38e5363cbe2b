use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::FileRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    ReceiptUploaded,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::ReceiptUploaded => "receipt_uploaded",
            InvoiceStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub amount: Option<Decimal>,
    pub file: FileRef,
    pub status: InvoiceStatus,
    pub receipt: Option<FileRef>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Partial update of one invoice, applied by the store inside a job commit.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceChange {
    pub invoice_id: Uuid,
    pub status: InvoiceStatus,
    pub receipt: Option<FileRef>,
    pub comment: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl InvoiceChange {
    pub fn apply_to(&self, invoice: &mut Invoice) {
        invoice.status = self.status;
        if let Some(receipt) = &self.receipt {
            invoice.receipt = Some(receipt.clone());
        }
        if let Some(comment) = &self.comment {
            invoice.comment = Some(comment.clone());
        }
        if self.paid_at.is_some() {
            invoice.paid_at = self.paid_at;
        }
    }
}
