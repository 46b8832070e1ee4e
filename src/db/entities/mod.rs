//! SeaORM entities mapping the vendor and service tables.

pub mod service;
pub mod vendor;
