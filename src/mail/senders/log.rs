use async_trait::async_trait;
use tracing::info;

use crate::mail::{DeliveryError, EmailMessage, EmailSender};

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender;

impl LogEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        if message.to.is_empty() {
            return Err(DeliveryError::InvalidConfiguration(
                "Email has no recipients.".to_string(),
            ));
        }
        info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            "Email (log sender):\n{}",
            message.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: Vec<String>) -> EmailMessage {
        EmailMessage {
            from: "noreply@vendormanagement.com".to_string(),
            to,
            subject: "subject".to_string(),
            body: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_sender_accepts_message() {
        let sender = LogEmailSender::new();
        assert!(sender.send(&message(vec!["a@example.com".to_string()])).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sender_rejects_empty_recipients() {
        let sender = LogEmailSender::new();
        let result = sender.send(&message(Vec::new())).await;
        assert!(matches!(result, Err(DeliveryError::InvalidConfiguration(_))));
    }
}
