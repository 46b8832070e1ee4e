//! Service status classification and the reminder job built on it.

use sea_orm::DbErr;
use thiserror::Error;

pub mod dispatcher;
pub mod grouping;
pub mod selector;
pub mod service;
pub mod status;

pub use dispatcher::{MailSettings, ReminderTarget, Summary};
pub use grouping::ColorGroups;
pub use selector::{ReminderFlags, ReminderSelection};
pub use service::{ReminderService, ReminderSettings};
pub use status::{
    Color, DEFAULT_HORIZON_DAYS, StatusCategory, classify, is_expiring_soon, is_payment_due_soon,
};

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Selected service {0} could not be resolved")]
    MissingTarget(i32),
}
