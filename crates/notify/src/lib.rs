use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use webscout_core::CrawlError;

/// SMTP relay for change notifications.
const RELAY: &str = "localhost";
const SENDER: &str = "webscout@localhost";

/// One-shot outbound message on content-change events. Delivery failure is
/// logged and never affects crawling.
pub struct Notifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Notifier {
    pub fn new(recipient: &str) -> Result<Self, CrawlError> {
        let to: Mailbox = recipient.parse().map_err(|e| {
            CrawlError::Notify(format!("invalid notification address {recipient}: {e}"))
        })?;
        let from: Mailbox = SENDER
            .parse()
            .map_err(|e| CrawlError::Notify(format!("invalid sender address: {e}")))?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(RELAY).build();
        Ok(Self { mailer, from, to })
    }

    pub async fn notify(&self, subject: &str, body: &str) {
        let message = match Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(body.to_string())
        {
            Ok(m) => m,
            Err(e) => {
                warn!("failed to build notification: {e}");
                return;
            }
        };

        match self.mailer.send(message).await {
            Ok(_) => info!(to = %self.to, subject, "change notification sent"),
            Err(e) => warn!(to = %self.to, "notification delivery failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_recipient() {
        assert!(Notifier::new("user@example.com").is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        assert!(Notifier::new("not-an-address").is_err());
    }
}
