//! Data access for vendors and their services.
//!
//! Each sub-module owns one entity. Public functions are re-exported here so
//! callers can use `crate::db::services::*` without caring about the layout.

pub mod service_record_service;
pub mod vendor_service;

pub use service_record_service::*;
pub use vendor_service::*;
