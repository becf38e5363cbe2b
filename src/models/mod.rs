pub mod document;
pub mod invoice;
pub mod job;
pub mod role;
pub mod status;
