// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod console_api;
pub mod gluster_repository;
pub mod grafana_repository;
pub mod graphite_repository;
