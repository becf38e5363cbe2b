use chrono::{DateTime, Utc};

use super::actions::{ActionKind, ClientIntent, JobAction};
use super::{guards, invoice};
use crate::error::{Error, Result};
use crate::models::document::{Document, DocumentType};
use crate::models::invoice::InvoiceStatus;
use crate::models::job::{HistoryEntry, Job, JobUpdate};
use crate::models::role::{Actor, Role};
use crate::models::status::JobStatus;

pub fn authorize(role: Role, kind: ActionKind) -> Result<()> {
    if kind.permits(role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "role '{}' may not invoke {}",
            role,
            kind.name()
        )))
    }
}

fn normalize(comment: &Option<String>) -> Option<String> {
    comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Computes the commit for `action` against the `job` snapshot without
/// touching any storage. Order of checks: role, current status, payload.
pub fn plan(job: &Job, action: &JobAction, actor: &Actor, now: DateTime<Utc>) -> Result<JobUpdate> {
    let kind = action.kind();
    authorize(actor.role, kind)?;
    guards::ensure_state(job, kind)?;

    let mut update = JobUpdate::default();
    let (to, comment) = match action {
        JobAction::RecordCallOutcome { reached, comment } => {
            let to = if *reached {
                JobStatus::Bajarilmoqda
            } else {
                JobStatus::AloqaUzildi
            };
            (to, normalize(comment))
        }
        JobAction::RecordClientIntent {
            intent,
            future_date,
            comment,
        } => {
            guards::can_record_client_intent(*intent, *future_date, now.date_naive())?;
            match intent {
                ClientIntent::Later => {
                    update.patch.future_date = *future_date;
                    (JobStatus::Keyinroq, normalize(comment))
                }
                ClientIntent::Decline => (JobStatus::Rejected, normalize(comment)),
            }
        }
        JobAction::SendForReview {
            brand_name,
            classes,
            comment,
        } => {
            let classes = guards::can_send_for_review(brand_name, classes)?;
            update.patch.brand_name = Some(brand_name.trim().to_string());
            update.patch.classes = Some(classes);
            (JobStatus::BrandInReview, normalize(comment))
        }
        JobAction::ReviewBrand {
            approved,
            reason,
            classes,
        } => {
            update.patch.classes =
                guards::can_review_brand(job, *approved, reason.as_deref(), classes.as_deref())?;
            let to = if *approved {
                JobStatus::Approved
            } else {
                JobStatus::ReturnedToOperator
            };
            (to, normalize(reason))
        }
        JobAction::StartDocumentCollection { comment } => {
            (JobStatus::DocumentsPending, normalize(comment))
        }
        JobAction::SubmitDocuments { docs, comment } => {
            let docs = guards::can_submit_documents(docs.as_ref())?;
            update.patch.person_docs = Some(docs.clone());
            (JobStatus::DocumentsSubmitted, normalize(comment))
        }
        JobAction::ReturnDocuments { reason } => {
            guards::can_return_documents(reason.as_deref())?;
            (JobStatus::DocumentsReturned, normalize(reason))
        }
        JobAction::SendToLawyer { comment } => {
            guards::can_send_to_lawyer(job)?;
            (JobStatus::ToLawyer, normalize(comment))
        }
        JobAction::AcceptByLawyer { comment } => {
            guards::can_accept_by_lawyer(job)?;
            (JobStatus::LawyerProcessing, normalize(comment))
        }
        JobAction::SendInvoice {
            file,
            amount,
            comment,
        } => {
            let file = guards::can_send_invoice(job, file.as_ref(), *amount)?;
            let comment = normalize(comment);
            update.new_invoice = Some(invoice::create_invoice(
                file.clone(),
                *amount,
                comment.clone(),
                now,
            ));
            (JobStatus::LawyerProcessing, comment)
        }
        JobAction::UploadReceipt {
            invoice_id,
            file,
            comment,
        } => {
            let receipt = guards::can_upload_receipt(job, *invoice_id, file.as_ref())?;
            let comment = normalize(comment);
            let target = invoice::find_invoice(job, *invoice_id)?;
            update.invoice_change = Some(invoice::receipt_change(
                target,
                receipt.clone(),
                comment.clone(),
            ));
            (job.status, comment)
        }
        JobAction::ApproveReceipt {
            invoice_id,
            comment,
        } => {
            guards::can_approve_receipt(job, *invoice_id)?;
            let comment = normalize(comment);
            let target = invoice::find_invoice(job, *invoice_id)?;
            update.invoice_change = Some(invoice::payment_change(target, comment.clone(), now));
            (job.status, comment)
        }
        JobAction::CompleteByLawyer {
            certificate,
            comment,
        } => {
            let certificate =
                guards::can_complete_by_lawyer(job, certificate.as_ref(), comment.as_deref())?;
            update.new_documents.push(Document::new(
                DocumentType::Certificate,
                certificate.clone(),
                now,
            ));
            (JobStatus::LawyerCompleted, normalize(comment))
        }
        JobAction::DeliverCertificate { comment } => (JobStatus::Finished, normalize(comment)),
        JobAction::GeneratePowerOfAttorney { comment } => {
            guards::can_generate_power_of_attorney(job)?;
            (job.status, normalize(comment))
        }
    };

    if comment.is_some() {
        update.patch.comments = comment.clone();
    }
    update.status = Some(to);
    update.history = Some(HistoryEntry {
        action: kind.name().to_string(),
        actor_role: actor.role,
        actor_id: Some(actor.id.clone()),
        from_status: job.status,
        status: to,
        comment,
        at: now,
    });
    Ok(update)
}

/// Actions `role` could successfully start on `job` right now, as far as
/// status and invoice sub-states go. Payload guards still apply.
pub fn next_actions(job: &Job, role: Role) -> Vec<ActionKind> {
    let has_invoice = |status: InvoiceStatus| job.invoices.iter().any(|i| i.status == status);
    ActionKind::ALL
        .into_iter()
        .filter(|kind| kind.permits(role) && kind.is_legal_from(job.status))
        .filter(|kind| match kind {
            ActionKind::UploadReceipt => has_invoice(InvoiceStatus::Pending),
            ActionKind::ApproveReceipt => has_invoice(InvoiceStatus::ReceiptUploaded),
            ActionKind::CompleteByLawyer => job.is_paid(),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::FileRef;
    use crate::models::job::{JismoniyDocs, MktuClasses, NewJob, PersonDocs};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    fn job_in(status: JobStatus) -> Job {
        let mut job = Job::new(
            NewJob {
                client_name: "Akmal".into(),
                ..Default::default()
            },
            "TM-PLAN0001".into(),
            Utc::now(),
        );
        job.status = status;
        job
    }

    /// A payload that passes its own guards whenever the state allows it.
    fn sample_action(kind: ActionKind) -> JobAction {
        let file = Some(FileRef::new("uploads/x.pdf"));
        match kind {
            ActionKind::RecordCallOutcome => JobAction::RecordCallOutcome {
                reached: false,
                comment: None,
            },
            ActionKind::RecordClientIntent => JobAction::RecordClientIntent {
                intent: ClientIntent::Decline,
                future_date: None,
                comment: None,
            },
            ActionKind::SendForReview => JobAction::SendForReview {
                brand_name: "Akmal".into(),
                classes: vec![25],
                comment: None,
            },
            ActionKind::ReviewBrand => JobAction::ReviewBrand {
                approved: true,
                reason: None,
                classes: Some(vec![25]),
            },
            ActionKind::StartDocumentCollection => {
                JobAction::StartDocumentCollection { comment: None }
            }
            ActionKind::SubmitDocuments => JobAction::SubmitDocuments {
                docs: Some(PersonDocs::Jismoniy(JismoniyDocs {
                    passport_image_front: file.clone(),
                    passport_image_back: file.clone(),
                    full_brand_name: Some("Akmal".into()),
                    full_address: None,
                })),
                comment: None,
            },
            ActionKind::ReturnDocuments => JobAction::ReturnDocuments {
                reason: Some("blurry".into()),
            },
            ActionKind::SendToLawyer => JobAction::SendToLawyer { comment: None },
            ActionKind::AcceptByLawyer => JobAction::AcceptByLawyer { comment: None },
            ActionKind::SendInvoice => JobAction::SendInvoice {
                file: file.clone(),
                amount: Some(Decimal::new(500000, 0)),
                comment: None,
            },
            ActionKind::UploadReceipt => JobAction::UploadReceipt {
                invoice_id: Uuid::new_v4(),
                file: file.clone(),
                comment: None,
            },
            ActionKind::ApproveReceipt => JobAction::ApproveReceipt {
                invoice_id: Uuid::new_v4(),
                comment: None,
            },
            ActionKind::CompleteByLawyer => JobAction::CompleteByLawyer {
                certificate: file.clone(),
                comment: Some("tayyor".into()),
            },
            ActionKind::DeliverCertificate => JobAction::DeliverCertificate { comment: None },
            ActionKind::GeneratePowerOfAttorney => {
                JobAction::GeneratePowerOfAttorney { comment: None }
            }
        }
    }

    #[test]
    fn every_unlisted_pair_is_invalid_state() {
        for status in JobStatus::ALL {
            for kind in ActionKind::ALL {
                if kind.is_legal_from(status) {
                    continue;
                }
                let job = job_in(status);
                let err = plan(&job, &sample_action(kind), &admin(), Utc::now()).unwrap_err();
                assert_eq!(
                    err.code(),
                    "invalid_state",
                    "{} from {} should be invalid",
                    kind.name(),
                    status
                );
            }
        }
    }

    #[test]
    fn planned_status_is_always_in_the_status_set() {
        let job = job_in(JobStatus::Yangi);
        let update = plan(&job, &sample_action(ActionKind::SendForReview), &admin(), Utc::now()).unwrap();
        assert!(JobStatus::ALL.contains(&update.status.unwrap()));
        let entry = update.history.unwrap();
        assert_eq!(entry.action, "sendForReview");
        assert_eq!(entry.from_status, JobStatus::Yangi);
        assert_eq!(entry.status, JobStatus::BrandInReview);
    }

    #[test]
    fn wrong_role_is_forbidden_before_state_is_checked() {
        let job = job_in(JobStatus::Finished);
        let lawyer = Actor::new("l-1", Role::Lawyer);
        let err = plan(&job, &sample_action(ActionKind::SendForReview), &lawyer, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn rejection_reason_becomes_the_comment() {
        let job = job_in(JobStatus::BrandInReview);
        let action = JobAction::ReviewBrand {
            approved: false,
            reason: Some("Band nom".into()),
            classes: None,
        };
        let update = plan(&job, &action, &Actor::new("r-1", Role::Reviewer), Utc::now()).unwrap();
        assert_eq!(update.status, Some(JobStatus::ReturnedToOperator));
        assert_eq!(update.patch.comments.as_deref(), Some("Band nom"));
        assert_eq!(update.history.unwrap().comment.as_deref(), Some("Band nom"));
    }

    #[test]
    fn next_actions_follow_invoice_sub_states() {
        let mut job = job_in(JobStatus::LawyerProcessing);
        job.classes = MktuClasses::try_from(vec![25]).unwrap();
        let lawyer = next_actions(&job, Role::Lawyer);
        assert!(lawyer.contains(&ActionKind::SendInvoice));
        assert!(!lawyer.contains(&ActionKind::ApproveReceipt));
        assert!(!lawyer.contains(&ActionKind::CompleteByLawyer));

        let mut bill = invoice::create_invoice(FileRef::new("bill.pdf"), None, None, Utc::now());
        bill.status = InvoiceStatus::ReceiptUploaded;
        job.invoices.push(bill);
        assert!(next_actions(&job, Role::Reviewer).contains(&ActionKind::ApproveReceipt));
        assert!(!next_actions(&job, Role::Operator).contains(&ActionKind::UploadReceipt));
    }
}
