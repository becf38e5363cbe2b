use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::document::FileRef;
use crate::models::job::PersonDocs;
use crate::models::role::Role;
use crate::models::status::JobStatus;

use JobStatus::*;

/// Name of every action a role can invoke on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    RecordCallOutcome,
    RecordClientIntent,
    SendForReview,
    ReviewBrand,
    StartDocumentCollection,
    SubmitDocuments,
    ReturnDocuments,
    SendToLawyer,
    AcceptByLawyer,
    SendInvoice,
    UploadReceipt,
    ApproveReceipt,
    CompleteByLawyer,
    DeliverCertificate,
    GeneratePowerOfAttorney,
}

impl ActionKind {
    pub const ALL: [ActionKind; 15] = [
        ActionKind::RecordCallOutcome,
        ActionKind::RecordClientIntent,
        ActionKind::SendForReview,
        ActionKind::ReviewBrand,
        ActionKind::StartDocumentCollection,
        ActionKind::SubmitDocuments,
        ActionKind::ReturnDocuments,
        ActionKind::SendToLawyer,
        ActionKind::AcceptByLawyer,
        ActionKind::SendInvoice,
        ActionKind::UploadReceipt,
        ActionKind::ApproveReceipt,
        ActionKind::CompleteByLawyer,
        ActionKind::DeliverCertificate,
        ActionKind::GeneratePowerOfAttorney,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::RecordCallOutcome => "recordCallOutcome",
            ActionKind::RecordClientIntent => "recordClientIntent",
            ActionKind::SendForReview => "sendForReview",
            ActionKind::ReviewBrand => "reviewBrand",
            ActionKind::StartDocumentCollection => "startDocumentCollection",
            ActionKind::SubmitDocuments => "submitDocuments",
            ActionKind::ReturnDocuments => "returnDocuments",
            ActionKind::SendToLawyer => "sendToLawyer",
            ActionKind::AcceptByLawyer => "acceptByLawyer",
            ActionKind::SendInvoice => "sendInvoice",
            ActionKind::UploadReceipt => "uploadReceipt",
            ActionKind::ApproveReceipt => "approveReceipt",
            ActionKind::CompleteByLawyer => "completeByLawyer",
            ActionKind::DeliverCertificate => "deliverCertificate",
            ActionKind::GeneratePowerOfAttorney => "generatePowerOfAttorney",
        }
    }

    /// Statuses from which the action is legal. Anything else is an
    /// invalid-state failure.
    pub fn allowed_from(&self) -> &'static [JobStatus] {
        match self {
            ActionKind::RecordCallOutcome => &[Yangi, AloqaUzildi, Keyinroq],
            ActionKind::RecordClientIntent => &[Yangi, Bajarilmoqda, AloqaUzildi, Keyinroq],
            ActionKind::SendForReview => &[Yangi, Bajarilmoqda, Keyinroq, ReturnedToOperator],
            ActionKind::ReviewBrand => &[BrandInReview],
            ActionKind::StartDocumentCollection => &[Approved],
            ActionKind::SubmitDocuments => &[Approved, DocumentsPending, DocumentsReturned],
            ActionKind::ReturnDocuments => &[DocumentsSubmitted],
            ActionKind::SendToLawyer => &[DocumentsSubmitted],
            ActionKind::AcceptByLawyer => &[ToLawyer],
            ActionKind::SendInvoice => &[LawyerProcessing],
            ActionKind::UploadReceipt => &[LawyerProcessing],
            ActionKind::ApproveReceipt => &[LawyerProcessing],
            ActionKind::CompleteByLawyer => &[LawyerProcessing],
            ActionKind::DeliverCertificate => &[LawyerCompleted],
            ActionKind::GeneratePowerOfAttorney => &[
                Approved,
                DocumentsPending,
                DocumentsSubmitted,
                DocumentsReturned,
                ToLawyer,
                LawyerProcessing,
            ],
        }
    }

    /// Roles allowed to invoke the action. Admin is always allowed.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            ActionKind::RecordCallOutcome
            | ActionKind::RecordClientIntent
            | ActionKind::SendForReview
            | ActionKind::StartDocumentCollection
            | ActionKind::SubmitDocuments
            | ActionKind::DeliverCertificate => &[Role::Operator],
            ActionKind::ReviewBrand | ActionKind::ReturnDocuments | ActionKind::SendToLawyer => {
                &[Role::Reviewer]
            }
            ActionKind::AcceptByLawyer | ActionKind::SendInvoice | ActionKind::CompleteByLawyer => {
                &[Role::Lawyer]
            }
            ActionKind::UploadReceipt | ActionKind::GeneratePowerOfAttorney => {
                &[Role::Operator, Role::Reviewer, Role::Lawyer]
            }
            ActionKind::ApproveReceipt => &[Role::Reviewer, Role::Lawyer],
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        role == Role::Admin || self.allowed_roles().contains(&role)
    }

    pub fn is_legal_from(&self, status: JobStatus) -> bool {
        self.allowed_from().contains(&status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientIntent {
    Later,
    Decline,
}

/// A requested transition with its payload, as received from a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    RecordCallOutcome {
        reached: bool,
        comment: Option<String>,
    },
    RecordClientIntent {
        intent: ClientIntent,
        future_date: Option<NaiveDate>,
        comment: Option<String>,
    },
    SendForReview {
        brand_name: String,
        classes: Vec<i64>,
        comment: Option<String>,
    },
    ReviewBrand {
        approved: bool,
        reason: Option<String>,
        classes: Option<Vec<i64>>,
    },
    StartDocumentCollection {
        comment: Option<String>,
    },
    SubmitDocuments {
        docs: Option<PersonDocs>,
        comment: Option<String>,
    },
    ReturnDocuments {
        reason: Option<String>,
    },
    SendToLawyer {
        comment: Option<String>,
    },
    AcceptByLawyer {
        comment: Option<String>,
    },
    SendInvoice {
        file: Option<FileRef>,
        amount: Option<Decimal>,
        comment: Option<String>,
    },
    UploadReceipt {
        invoice_id: Uuid,
        file: Option<FileRef>,
        comment: Option<String>,
    },
    ApproveReceipt {
        invoice_id: Uuid,
        comment: Option<String>,
    },
    CompleteByLawyer {
        certificate: Option<FileRef>,
        comment: Option<String>,
    },
    DeliverCertificate {
        comment: Option<String>,
    },
    GeneratePowerOfAttorney {
        comment: Option<String>,
    },
}

impl JobAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            JobAction::RecordCallOutcome { .. } => ActionKind::RecordCallOutcome,
            JobAction::RecordClientIntent { .. } => ActionKind::RecordClientIntent,
            JobAction::SendForReview { .. } => ActionKind::SendForReview,
            JobAction::ReviewBrand { .. } => ActionKind::ReviewBrand,
            JobAction::StartDocumentCollection { .. } => ActionKind::StartDocumentCollection,
            JobAction::SubmitDocuments { .. } => ActionKind::SubmitDocuments,
            JobAction::ReturnDocuments { .. } => ActionKind::ReturnDocuments,
            JobAction::SendToLawyer { .. } => ActionKind::SendToLawyer,
            JobAction::AcceptByLawyer { .. } => ActionKind::AcceptByLawyer,
            JobAction::SendInvoice { .. } => ActionKind::SendInvoice,
            JobAction::UploadReceipt { .. } => ActionKind::UploadReceipt,
            JobAction::ApproveReceipt { .. } => ActionKind::ApproveReceipt,
            JobAction::CompleteByLawyer { .. } => ActionKind::CompleteByLawyer,
            JobAction::DeliverCertificate { .. } => ActionKind::DeliverCertificate,
            JobAction::GeneratePowerOfAttorney { .. } => ActionKind::GeneratePowerOfAttorney,
        }
    }

    /// Blob references carried by the payload, keyed by field name; each
    /// must exist in storage before the action commits.
    pub fn file_refs(&self) -> Vec<(&'static str, &FileRef)> {
        match self {
            JobAction::SubmitDocuments { docs: Some(docs), .. } => docs.file_refs(),
            JobAction::SendInvoice { file: Some(file), .. } => vec![("file", file)],
            JobAction::UploadReceipt { file: Some(file), .. } => vec![("file", file)],
            JobAction::CompleteByLawyer {
                certificate: Some(file),
                ..
            } => vec![("certificateFile", file)],
            _ => Vec::new(),
        }
    }
}
