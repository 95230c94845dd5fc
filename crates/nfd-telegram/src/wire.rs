//! Telegram update JSON, reduced to the fields routing needs.
//!
//! Parsed with local serde types rather than teloxide's full `Update` so a
//! payload with fields we do not model (new message kinds, newer Bot API
//! versions) still routes. Unknown fields are ignored.

use serde::Deserialize;

use nfd_core::{
    domain::{ChatId, MessageId},
    errors::Error,
    messaging::types::{IncomingMessage, IncomingUpdate, RepliedMessage},
    Result,
};

#[derive(Debug, Deserialize)]
struct WireUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    message_id: i32,
    chat: WireChat,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    reply_to_message: Option<WireReply>,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    message_id: i32,
    #[serde(default)]
    chat: Option<WireChat>,
}

#[derive(Debug, Deserialize)]
struct WireChat {
    id: i64,
}

/// Parse a webhook body. Anything that is not a Telegram update is
/// `MalformedUpdate`.
pub fn parse_update(body: &[u8]) -> Result<IncomingUpdate> {
    let raw: WireUpdate =
        serde_json::from_slice(body).map_err(|e| Error::MalformedUpdate(e.to_string()))?;
    Ok(raw.into())
}

impl From<WireUpdate> for IncomingUpdate {
    fn from(u: WireUpdate) -> Self {
        IncomingUpdate {
            update_id: u.update_id,
            message: u.message.map(IncomingMessage::from),
        }
    }
}

impl From<WireMessage> for IncomingMessage {
    fn from(m: WireMessage) -> Self {
        IncomingMessage {
            message_id: MessageId(m.message_id),
            chat_id: ChatId(m.chat.id),
            text: m.text,
            // A reply only counts when the replied-to message carries its chat.
            reply_to: m
                .reply_to_message
                .filter(|r| r.chat.is_some())
                .map(|r| RepliedMessage {
                    message_id: MessageId(r.message_id),
                }),
        }
    }
}
