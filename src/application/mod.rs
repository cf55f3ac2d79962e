// Application layer - Use-case flows and collaborator seams
pub mod console;
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod import_service;
pub mod metrics_repository;
pub mod storage_repository;
pub mod wait;
