//! Message routing and moderation.
//!
//! One inbound update goes in; at most a couple of store operations and
//! messenger calls come out. Classification order:
//! 1. `/start` from anyone
//! 2. administrator messages (usage hint, moderation command, reply to a guest)
//! 3. guest messages (block check, forward, notify)

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    documents::{Document, DocumentSource},
    domain::{ChatId, MessageId},
    fraud::FraudList,
    messaging::{
        port::MessagingPort,
        types::{IncomingMessage, IncomingUpdate, RepliedMessage},
    },
    notify::{NotificationThrottler, ThrottleDecision},
    store::ModerationStore,
    Result,
};

pub const START_COMMAND: &str = "/start";

pub const USAGE_TEXT: &str = "Usage: reply to a forwarded message to answer the guest, \
or reply to it with /block, /unblock or /checkblock";
pub const YOU_ARE_BLOCKED_TEXT: &str = "You are blocked";
pub const SELF_BLOCK_TEXT: &str = "You cannot block yourself";
pub const UNKNOWN_CONVERSATION_TEXT: &str = "No guest is linked to that message";

/// Moderation commands the administrator sends as a reply to a forwarded message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    Block,
    Unblock,
    CheckBlock,
}

impl AdminCommand {
    /// Whole-text match only; `/block now` is an ordinary reply.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/block" => Some(Self::Block),
            "/unblock" => Some(Self::Unblock),
            "/checkblock" => Some(Self::CheckBlock),
            _ => None,
        }
    }
}

/// What the notify step did after a guest message was relayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    FraudAlert,
    Notified,
    Throttled,
    Disabled,
}

/// Result of routing one update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Ignored,
    StartSent {
        chat_id: ChatId,
    },
    UsageSent,
    UnknownConversation {
        replied_to: MessageId,
    },
    ReplyCopied {
        guest: ChatId,
        message_id: MessageId,
    },
    Blocked {
        guest: ChatId,
    },
    SelfBlockRefused,
    Unblocked {
        guest: ChatId,
    },
    BlockChecked {
        guest: ChatId,
        blocked: bool,
    },
    GuestBlocked {
        guest: ChatId,
    },
    GuestRelayed {
        guest: ChatId,
        forwarded: Option<MessageId>,
        notice: Notice,
    },
}

pub struct MessageRouter {
    cfg: Arc<Config>,
    store: ModerationStore,
    messenger: Arc<dyn MessagingPort>,
    documents: Arc<dyn DocumentSource>,
    fraud: FraudList,
    throttler: NotificationThrottler,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    pub fn new(
        cfg: Arc<Config>,
        store: ModerationStore,
        messenger: Arc<dyn MessagingPort>,
        documents: Arc<dyn DocumentSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let throttler = NotificationThrottler::new(
            store.clone(),
            cfg.notify_interval,
            cfg.enable_notification,
        );
        Self {
            fraud: FraudList::new(documents.clone()),
            cfg,
            store,
            messenger,
            documents,
            throttler,
            clock,
        }
    }

    fn admin(&self) -> ChatId {
        self.cfg.admin_chat_id
    }

    pub async fn handle_update(&self, update: IncomingUpdate) -> Result<RouteOutcome> {
        let Some(msg) = update.message else {
            return Ok(RouteOutcome::Ignored);
        };

        let outcome = self.handle_message(msg).await?;
        tracing::debug!(update_id = update.update_id, ?outcome, "update routed");
        Ok(outcome)
    }

    async fn handle_message(&self, msg: IncomingMessage) -> Result<RouteOutcome> {
        if msg.text() == Some(START_COMMAND) {
            let start = self.documents.fetch(Document::StartMessage).await?;
            self.messenger.send_text(msg.chat_id, &start).await?;
            return Ok(RouteOutcome::StartSent {
                chat_id: msg.chat_id,
            });
        }

        if msg.chat_id == self.admin() {
            return self.handle_admin(msg).await;
        }

        self.handle_guest(msg).await
    }

    async fn handle_admin(&self, msg: IncomingMessage) -> Result<RouteOutcome> {
        let Some(replied) = msg.reply_to.as_ref() else {
            self.messenger.send_text(self.admin(), USAGE_TEXT).await?;
            return Ok(RouteOutcome::UsageSent);
        };

        let Some(guest) = self.store.conversation(replied.message_id).await? else {
            return self.unknown_conversation(replied).await;
        };

        if let Some(cmd) = msg.text().and_then(AdminCommand::parse) {
            return self.moderate(cmd, guest).await;
        }

        let message_id = self
            .messenger
            .copy_message(guest, msg.chat_id, msg.message_id)
            .await?;
        tracing::info!(guest = %guest, "administrator reply delivered");
        Ok(RouteOutcome::ReplyCopied { guest, message_id })
    }

    async fn unknown_conversation(&self, replied: &RepliedMessage) -> Result<RouteOutcome> {
        tracing::warn!(
            replied_to = %replied.message_id,
            "no conversation mapping for replied-to message"
        );
        self.messenger
            .send_text(self.admin(), UNKNOWN_CONVERSATION_TEXT)
            .await?;
        Ok(RouteOutcome::UnknownConversation {
            replied_to: replied.message_id,
        })
    }

    async fn moderate(&self, cmd: AdminCommand, guest: ChatId) -> Result<RouteOutcome> {
        match cmd {
            AdminCommand::Block => {
                if guest == self.admin() {
                    self.messenger.send_text(self.admin(), SELF_BLOCK_TEXT).await?;
                    return Ok(RouteOutcome::SelfBlockRefused);
                }
                self.store.set_blocked(guest, true).await?;
                tracing::info!(guest = %guest, "guest blocked");
                self.messenger
                    .send_text(self.admin(), &format!("UID:{guest} blocked"))
                    .await?;
                Ok(RouteOutcome::Blocked { guest })
            }
            AdminCommand::Unblock => {
                self.store.set_blocked(guest, false).await?;
                tracing::info!(guest = %guest, "guest unblocked");
                self.messenger
                    .send_text(self.admin(), &format!("UID:{guest} unblocked"))
                    .await?;
                Ok(RouteOutcome::Unblocked { guest })
            }
            AdminCommand::CheckBlock => {
                let blocked = self.store.is_blocked(guest).await?;
                let state = if blocked { "is blocked" } else { "is not blocked" };
                self.messenger
                    .send_text(self.admin(), &format!("UID:{guest} {state}"))
                    .await?;
                Ok(RouteOutcome::BlockChecked { guest, blocked })
            }
        }
    }

    async fn handle_guest(&self, msg: IncomingMessage) -> Result<RouteOutcome> {
        let guest = msg.chat_id;

        if self.store.is_blocked(guest).await? {
            self.messenger.send_text(guest, YOU_ARE_BLOCKED_TEXT).await?;
            return Ok(RouteOutcome::GuestBlocked { guest });
        }

        let forwarded = match self
            .messenger
            .forward_message(self.admin(), guest, msg.message_id)
            .await
        {
            Ok(sent) => {
                self.store
                    .record_conversation(sent.message_id, guest)
                    .await?;
                Some(sent.message_id)
            }
            Err(e) => {
                // The guest is not told; the administrator simply never sees it.
                tracing::warn!(guest = %guest, error = %e, "forward to administrator failed");
                None
            }
        };

        let notice = self.notify_admin(guest).await?;
        Ok(RouteOutcome::GuestRelayed {
            guest,
            forwarded,
            notice,
        })
    }

    async fn notify_admin(&self, guest: ChatId) -> Result<Notice> {
        if self.fraud.is_flagged(guest).await? {
            tracing::warn!(guest = %guest, "guest is on the fraud list");
            self.messenger
                .send_text(self.admin(), &format!("Fraud alert: UID {guest}"))
                .await?;
            return Ok(Notice::FraudAlert);
        }

        match self.throttler.check(guest, self.clock.now_ms()).await? {
            ThrottleDecision::Notify => {
                let text = self.documents.fetch(Document::Notification).await?;
                self.messenger.send_text(self.admin(), &text).await?;
                Ok(Notice::Notified)
            }
            ThrottleDecision::Throttled { .. } => Ok(Notice::Throttled),
            ThrottleDecision::Disabled => Ok(Notice::Disabled),
        }
    }
}
