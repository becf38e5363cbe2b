use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every status a job can hold. Wire names are the ones the dashboards
/// already persist, so they are kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Yangi,
    Bajarilmoqda,
    AloqaUzildi,
    Keyinroq,
    Rejected,
    BrandInReview,
    Approved,
    ReturnedToOperator,
    DocumentsPending,
    DocumentsSubmitted,
    DocumentsReturned,
    ToLawyer,
    LawyerProcessing,
    LawyerCompleted,
    Finished,
    /// Legacy terminal value found in older records. Readable, never written.
    Bajarildi,
}

impl JobStatus {
    pub const ALL: [JobStatus; 16] = [
        JobStatus::Yangi,
        JobStatus::Bajarilmoqda,
        JobStatus::AloqaUzildi,
        JobStatus::Keyinroq,
        JobStatus::Rejected,
        JobStatus::BrandInReview,
        JobStatus::Approved,
        JobStatus::ReturnedToOperator,
        JobStatus::DocumentsPending,
        JobStatus::DocumentsSubmitted,
        JobStatus::DocumentsReturned,
        JobStatus::ToLawyer,
        JobStatus::LawyerProcessing,
        JobStatus::LawyerCompleted,
        JobStatus::Finished,
        JobStatus::Bajarildi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Yangi => "yangi",
            JobStatus::Bajarilmoqda => "bajarilmoqda",
            JobStatus::AloqaUzildi => "aloqa_uzildi",
            JobStatus::Keyinroq => "keyinroq",
            JobStatus::Rejected => "rejected",
            JobStatus::BrandInReview => "brand_in_review",
            JobStatus::Approved => "approved",
            JobStatus::ReturnedToOperator => "returned_to_operator",
            JobStatus::DocumentsPending => "documents_pending",
            JobStatus::DocumentsSubmitted => "documents_submitted",
            JobStatus::DocumentsReturned => "documents_returned",
            JobStatus::ToLawyer => "to_lawyer",
            JobStatus::LawyerProcessing => "lawyer_processing",
            JobStatus::LawyerCompleted => "lawyer_completed",
            JobStatus::Finished => "finished",
            JobStatus::Bajarildi => "bajarildi",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Rejected | JobStatus::Finished | JobStatus::Bajarildi
        )
    }

    pub fn stage(&self) -> Stage {
        match self {
            JobStatus::Yangi
            | JobStatus::Bajarilmoqda
            | JobStatus::AloqaUzildi
            | JobStatus::Keyinroq => Stage::ClientContact,
            JobStatus::BrandInReview => Stage::BrandReview,
            JobStatus::ReturnedToOperator => Stage::BrandCorrection,
            JobStatus::Approved | JobStatus::DocumentsPending | JobStatus::DocumentsReturned => {
                Stage::DocumentCollection
            }
            JobStatus::DocumentsSubmitted => Stage::DocumentReview,
            JobStatus::ToLawyer => Stage::LawyerIntake,
            JobStatus::LawyerProcessing => Stage::LawyerProcessing,
            JobStatus::LawyerCompleted => Stage::CertificateDelivery,
            JobStatus::Rejected | JobStatus::Finished | JobStatus::Bajarildi => Stage::Closed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::error::Error::validation("status", format!("unknown status '{}'", s)))
    }
}

/// Coarse pipeline step shown to the dashboards instead of letting them
/// re-derive it from individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClientContact,
    BrandReview,
    BrandCorrection,
    DocumentCollection,
    DocumentReview,
    LawyerIntake,
    LawyerProcessing,
    CertificateDelivery,
    Closed,
}
