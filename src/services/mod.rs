// src/services/mod.rs

pub mod attempt_service;
pub mod catalog_service;
pub mod result_service;
pub mod scoring;
pub mod submission_service;

pub use attempt_service::AttemptService;
pub use catalog_service::CatalogService;
pub use result_service::ResultService;
pub use submission_service::SubmissionService;
