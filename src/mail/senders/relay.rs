use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Serialize;

use crate::mail::{DeliveryError, EmailMessage, EmailSender};

/// Delivers mail by POSTing it as JSON to an HTTP mail relay.
pub struct RelayEmailSender {
    client: Client,
    url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

impl RelayEmailSender {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            token,
        }
    }
}

#[async_trait]
impl EmailSender for RelayEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        if message.to.is_empty() {
            return Err(DeliveryError::InvalidConfiguration(
                "Email has no recipients.".to_string(),
            ));
        }

        let payload = RelayPayload {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request_builder = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request_builder = request_builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request_builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(DeliveryError::SendFailed(format!(
                "Mail relay returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    #[derive(Clone)]
    struct RelayState {
        seen: Seen,
        status: StatusCode,
    }

    async fn relay_handler(
        State(state): State<RelayState>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> StatusCode {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.seen.lock().unwrap().push((auth, body));
        state.status
    }

    /// Starts a local relay that answers every POST with `status`.
    async fn spawn_relay(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/send", post(relay_handler))
            .with_state(RelayState { seen: seen.clone(), status });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/send"), seen)
    }

    fn message() -> EmailMessage {
        EmailMessage {
            from: "noreply@vendormanagement.com".to_string(),
            to: vec!["billing@acme.test".to_string()],
            subject: "Vendor Management Alert: Payment Due in 3 days".to_string(),
            body: "Dear Jo,".to_string(),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_reported_as_send_failure() {
        let (url, seen) = spawn_relay(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sender = RelayEmailSender::new(url, None);

        let result = sender.send(&message()).await;
        match result {
            Err(DeliveryError::SendFailed(msg)) => assert!(msg.contains("500")),
            other => panic!("expected SendFailed, got {other:?}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bearer_token_and_payload_are_sent() {
        let (url, seen) = spawn_relay(StatusCode::OK).await;
        let sender = RelayEmailSender::new(url, Some("secret-token".to_string()));

        sender.send(&message()).await.unwrap();

        let seen = seen.lock().unwrap();
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
        assert_eq!(body["from"], "noreply@vendormanagement.com");
        assert_eq!(body["to"], serde_json::json!(["billing@acme.test"]));
        assert_eq!(body["subject"], "Vendor Management Alert: Payment Due in 3 days");
        assert_eq!(body["text"], "Dear Jo,");
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let (url, seen) = spawn_relay(StatusCode::ACCEPTED).await;
        let sender = RelayEmailSender::new(url, None);

        sender.send(&message()).await.unwrap();
        assert_eq!(seen.lock().unwrap()[0].0, None);
    }

    #[tokio::test]
    async fn test_empty_recipients_never_reach_the_relay() {
        let (url, seen) = spawn_relay(StatusCode::OK).await;
        let sender = RelayEmailSender::new(url, None);
        let mut empty = message();
        empty.to.clear();

        let result = sender.send(&empty).await;
        assert!(matches!(result, Err(DeliveryError::InvalidConfiguration(_))));
        assert!(seen.lock().unwrap().is_empty());
    }
}
