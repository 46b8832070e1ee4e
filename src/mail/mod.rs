use async_trait::async_trait;
use thiserror::Error;

pub mod senders;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// A fully composed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// A trait for delivering an email through some transport.
///
/// Implementations must report failure through `Err` rather than dropping the
/// message, since callers count failed deliveries.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}
