//! Remote text documents over plain HTTP GET (start message, notification
//! text, fraud list). Fetched fresh on every call; no caching, no integrity
//! check.

use std::time::Duration;

use async_trait::async_trait;

use nfd_core::{
    config::DocumentUrls,
    documents::{Document, DocumentSource},
    errors::Error,
    Result,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct HttpDocumentSource {
    urls: DocumentUrls,
    http: reqwest::Client,
}

impl HttpDocumentSource {
    pub fn new(urls: DocumentUrls) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("nfd-relay/0.1")
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { urls, http })
    }

    pub fn url_for(&self, doc: Document) -> &str {
        match doc {
            Document::StartMessage => &self.urls.start_message,
            Document::Notification => &self.urls.notification,
            Document::FraudList => &self.urls.fraud_db,
        }
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, doc: Document) -> Result<String> {
        let url = self.url_for(doc);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::External(format!("fetch {doc} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(Error::External(format!(
                "fetch {doc} failed: {status} from {url}"
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("fetch {doc} body failed: {e}")))?;
        tracing::debug!(document = %doc, bytes = text.len(), "document fetched");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> DocumentUrls {
        DocumentUrls {
            start_message: "http://127.0.0.1:9/start.md".to_string(),
            notification: "http://127.0.0.1:9/notification.txt".to_string(),
            fraud_db: "http://127.0.0.1:9/fraud.db".to_string(),
        }
    }

    #[test]
    fn each_document_has_its_own_url() {
        let src = HttpDocumentSource::new(urls()).unwrap();
        assert!(src.url_for(Document::StartMessage).ends_with("start.md"));
        assert!(src
            .url_for(Document::Notification)
            .ends_with("notification.txt"));
        assert!(src.url_for(Document::FraudList).ends_with("fraud.db"));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_external_error() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let src = HttpDocumentSource::new(urls()).unwrap();
        let err = src.fetch(Document::FraudList).await.unwrap_err();
        assert!(matches!(err, Error::External(ref m) if m.contains("fraud list")));
    }
}
