use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    Result,
};

/// Outbound messenger port used by the router.
///
/// `Ok` is the platform's success flag; the returned ids are whatever the
/// platform assigned to the new message.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Forward with the "forwarded from" marker intact.
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef>;

    /// Re-send content without provenance.
    async fn copy_message(&self, to: ChatId, from: ChatId, message_id: MessageId)
        -> Result<MessageId>;
}

/// Webhook (un)registration with the messaging platform.
#[async_trait]
pub trait WebhookPort: Send + Sync {
    async fn register_webhook(&self, url: &str, secret: &str) -> Result<()>;
    async fn unregister_webhook(&self) -> Result<()>;
}
