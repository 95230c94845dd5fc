use crate::domain::{ChatId, MessageId};

/// Messenger-agnostic inbound update.
///
/// Telegram wire fields live in the Telegram adapter; this keeps only what
/// routing needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncomingUpdate {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub text: Option<String>,
    pub reply_to: Option<RepliedMessage>,
}

/// The message an inbound message replies to. Only its id matters: it is
/// the key of the conversation mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepliedMessage {
    pub message_id: MessageId,
}

impl IncomingMessage {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
