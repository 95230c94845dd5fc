use std::time::Duration;

use crate::{domain::ChatId, store::ModerationStore, Result};

/// Per-guest "new message" notification throttle.
///
/// Read-then-write with no compare-and-set: two concurrent messages from the
/// same guest may both pass.
#[derive(Clone)]
pub struct NotificationThrottler {
    store: ModerationStore,
    interval_ms: i64,
    enabled: bool,
}

/// Why a throttle check did or did not let a notification through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    Notify,
    Throttled { last_ms: i64 },
    Disabled,
}

impl NotificationThrottler {
    pub fn new(store: ModerationStore, interval: Duration, enabled: bool) -> Self {
        Self {
            store,
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
            enabled,
        }
    }

    /// On `Notify` the new timestamp has already been written.
    pub async fn check(&self, chat_id: ChatId, now_ms: i64) -> Result<ThrottleDecision> {
        if !self.enabled {
            return Ok(ThrottleDecision::Disabled);
        }

        if let Some(last_ms) = self.store.last_notification(chat_id).await? {
            if now_ms.saturating_sub(last_ms) <= self.interval_ms {
                return Ok(ThrottleDecision::Throttled { last_ms });
            }
        }

        self.store.set_last_notification(chat_id, now_ms).await?;
        Ok(ThrottleDecision::Notify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_millis(3_600_000);
    const T: i64 = 1_700_000_000_000;

    fn throttler(enabled: bool) -> (ModerationStore, NotificationThrottler) {
        let store = ModerationStore::new(Arc::new(MemoryStore::new()));
        (store.clone(), NotificationThrottler::new(store, HOUR, enabled))
    }

    #[tokio::test]
    async fn first_message_notifies_and_records() {
        let (store, t) = throttler(true);
        assert_eq!(t.check(ChatId(1), T).await.unwrap(), ThrottleDecision::Notify);
        assert_eq!(store.last_notification(ChatId(1)).await.unwrap(), Some(T));
    }

    #[tokio::test]
    async fn within_interval_is_throttled_without_write() {
        let (store, t) = throttler(true);
        store.set_last_notification(ChatId(1), T).await.unwrap();

        assert_eq!(
            t.check(ChatId(1), T + 1).await.unwrap(),
            ThrottleDecision::Throttled { last_ms: T }
        );
        // Exactly one interval is still inside the window.
        assert_eq!(
            t.check(ChatId(1), T + 3_600_000).await.unwrap(),
            ThrottleDecision::Throttled { last_ms: T }
        );
        assert_eq!(store.last_notification(ChatId(1)).await.unwrap(), Some(T));
    }

    #[tokio::test]
    async fn past_interval_notifies_and_updates() {
        let (store, t) = throttler(true);
        store.set_last_notification(ChatId(1), T).await.unwrap();

        assert_eq!(
            t.check(ChatId(1), T + 3_600_001).await.unwrap(),
            ThrottleDecision::Notify
        );
        assert_eq!(
            store.last_notification(ChatId(1)).await.unwrap(),
            Some(T + 3_600_001)
        );
    }

    #[tokio::test]
    async fn clock_going_backwards_never_rewinds_the_timestamp() {
        let (store, t) = throttler(true);
        store.set_last_notification(ChatId(1), T).await.unwrap();

        assert!(matches!(
            t.check(ChatId(1), T - 10_000_000).await.unwrap(),
            ThrottleDecision::Throttled { .. }
        ));
        assert_eq!(store.last_notification(ChatId(1)).await.unwrap(), Some(T));
    }

    #[tokio::test]
    async fn guests_are_throttled_independently() {
        let (_, t) = throttler(true);
        assert_eq!(t.check(ChatId(1), T).await.unwrap(), ThrottleDecision::Notify);
        assert_eq!(t.check(ChatId(2), T).await.unwrap(), ThrottleDecision::Notify);
    }

    #[tokio::test]
    async fn disabled_never_touches_the_store() {
        let (store, t) = throttler(false);
        assert_eq!(
            t.check(ChatId(1), T).await.unwrap(),
            ThrottleDecision::Disabled
        );
        assert_eq!(store.last_notification(ChatId(1)).await.unwrap(), None);
    }
}
