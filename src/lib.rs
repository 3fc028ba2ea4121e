pub mod types;
pub mod price_infra;
pub mod interfaces;
pub mod storage;
pub mod error;
pub mod config;
pub mod observability;
pub mod api;
