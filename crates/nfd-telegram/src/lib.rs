//! Telegram adapter (teloxide).
//!
//! Implements the `nfd-core` messaging and webhook ports over the Telegram
//! Bot API and parses inbound webhook bodies.

use async_trait::async_trait;

use teloxide::prelude::*;

pub mod wire;

pub use wire::parse_update;

use nfd_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::{MessagingPort, WebhookPort},
    Result,
};

/// `X-Telegram-Bot-Api-Secret-Token`, lowercased for `http` header lookups.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    // Single attempt only; a failed call is reported, never retried.
    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    // Webhook maintenance hands the platform's own text back to the caller.
    fn raw_err(e: teloxide::RequestError) -> Error {
        Error::External(e.to_string())
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef> {
        let msg = self
            .bot
            .forward_message(
                Self::tg_chat(to),
                Self::tg_chat(from),
                Self::tg_msg_id(message_id),
            )
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageId> {
        let id = self
            .bot
            .copy_message(
                Self::tg_chat(to),
                Self::tg_chat(from),
                Self::tg_msg_id(message_id),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(MessageId(id.0))
    }
}

#[async_trait]
impl WebhookPort for TelegramMessenger {
    async fn register_webhook(&self, url: &str, secret: &str) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid webhook url {url}: {e}")))?;
        self.bot
            .set_webhook(url)
            .secret_token(secret.to_string())
            .await
            .map_err(Self::raw_err)?;
        tracing::info!("webhook registered");
        Ok(())
    }

    async fn unregister_webhook(&self) -> Result<()> {
        self.bot.delete_webhook().await.map_err(Self::raw_err)?;
        tracing::info!("webhook removed");
        Ok(())
    }
}
