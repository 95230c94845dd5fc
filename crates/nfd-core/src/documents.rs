use std::fmt;

use async_trait::async_trait;

use crate::Result;

/// Remote plain-text documents the relay consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Document {
    /// Markdown/plain text sent in answer to `/start`.
    StartMessage,
    /// Text sent to the administrator when a guest writes in.
    Notification,
    /// Newline-delimited flagged chat ids.
    FraudList,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Document::StartMessage => "start message",
            Document::Notification => "notification",
            Document::FraudList => "fraud list",
        };
        f.write_str(name)
    }
}

/// Fetches a document fresh on every call. No caching.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, doc: Document) -> Result<String>;
}
