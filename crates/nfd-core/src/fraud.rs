use std::sync::Arc;

use crate::{
    documents::{Document, DocumentSource},
    domain::ChatId,
    Result,
};

/// Remote fraud list, re-fetched on every check.
#[derive(Clone)]
pub struct FraudList {
    source: Arc<dyn DocumentSource>,
}

impl FraudList {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self { source }
    }

    /// Fetch failures propagate to the caller.
    pub async fn is_flagged(&self, chat_id: ChatId) -> Result<bool> {
        let db = self.source.fetch(Document::FraudList).await?;
        Ok(list_contains(&db, chat_id))
    }
}

/// Exact line match against the chat id's decimal text; empty lines are skipped.
pub fn list_contains(db: &str, chat_id: ChatId) -> bool {
    let id = chat_id.to_string();
    db.split('\n').filter(|line| !line.is_empty()).any(|line| line == id)
}
