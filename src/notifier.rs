use serde::Serialize;
use tracing::info;

use crate::error::NotifyError;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Success,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    kind: NotifyKind,
    message: &'a str,
}

/// Where site notifications (contact messages) go.
#[derive(Debug, Clone)]
pub enum Notifier {
    Log,
    Webhook { client: reqwest::Client, url: String },
}

impl Notifier {
    pub fn from_webhook_url(url: Option<&str>) -> Self {
        match url {
            Some(url) => Notifier::Webhook {
                client: reqwest::Client::new(),
                url: url.to_string(),
            },
            None => Notifier::Log,
        }
    }

    pub async fn notify(&self, kind: NotifyKind, message: &str) -> Result<(), NotifyError> {
        match self {
            Notifier::Log => {
                info!(?kind, "{}", message);
                Ok(())
            }
            Notifier::Webhook { client, url } => {
                client
                    .post(url)
                    .json(&WebhookPayload { kind, message })
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_shape() {
        let payload = WebhookPayload {
            kind: NotifyKind::Success,
            message: "hi",
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "kind": "success", "message": "hi" })
        );
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let notifier = Notifier::from_webhook_url(None);
        assert!(notifier.notify(NotifyKind::Success, "message").await.is_ok());
    }
}
