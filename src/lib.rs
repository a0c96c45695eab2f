//! Tender and bid marketplace core: versioned edits with rollback, gated by
//! organization membership.

pub mod authz;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod repository;
pub mod service;
pub mod status;
pub mod store;
pub mod types;
pub mod utils;
pub mod versioning;

pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use service::Marketplace;
