pub mod document_service;
pub mod export_service;
pub mod file_storage_service;
pub mod job_service;
pub mod notification_service;
pub mod worklist_service;
