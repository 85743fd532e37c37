//! AsyncNotificationManager implementation

use crate::notifications::error::NotificationError;
use crate::notifications::event::{Event, EventFilter};
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receiving side of a subscription.
pub type EventReceiver = UnboundedReceiver<Event>;

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
}

/// Routes batch events to any number of subscribers over unbounded channels.
///
/// Publication never blocks on a slow subscriber; a subscriber whose
/// receiver has been dropped is removed on the next publish.
pub struct AsyncNotificationManager {
    subscribers: HashMap<String, SubscriberInfo>,
}

impl AsyncNotificationManager {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Register a subscriber and return its event receiver.
    ///
    /// Re-subscribing under an existing id replaces the previous
    /// subscription (with a warning).
    pub fn subscribe(
        &mut self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> Result<EventReceiver, NotificationError> {
        if subscriber_id.is_empty() {
            return Err(NotificationError::EmptySubscriberId);
        }

        let (sender, receiver) = unbounded_channel();

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
        };

        if let Some(existing) = self.subscribers.insert(subscriber_id.clone(), subscriber_info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        Ok(receiver)
    }

    pub fn unsubscribe(&mut self, subscriber_id: &str) -> bool {
        self.subscribers.remove(subscriber_id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    /// Deliver an event to every subscriber whose filter accepts it.
    ///
    /// Subscribers with closed channels are dropped and reported in the
    /// error; delivery to the remaining subscribers still happens.
    pub fn publish(&mut self, event: Event) -> Result<(), NotificationError> {
        let mut failed_subscribers = Vec::new();
        let event_type = match &event {
            Event::Progress(_) => "Progress",
            Event::ItemResult(_) => "ItemResult",
            Event::Completed(_) => "Completed",
            Event::Error(_) => "Error",
        }
        .to_string();

        for (subscriber_id, subscriber_info) in &self.subscribers {
            if subscriber_info.filter.accepts(&event)
                && subscriber_info.sender.send(event.clone()).is_err()
            {
                // Channel is closed, mark for removal
                failed_subscribers.push(subscriber_id.clone());
            }
        }

        for subscriber_id in &failed_subscribers {
            self.subscribers.remove(subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type,
                failed_subscribers,
            });
        }

        Ok(())
    }
}

impl Default for AsyncNotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::progress::BatchProgress;
    use crate::notifications::event::{CompletionEvent, ErrorEvent};

    fn progress_event() -> Event {
        Event::Progress(BatchProgress::idle())
    }

    #[test]
    fn test_subscribe_rejects_empty_id() {
        let mut manager = AsyncNotificationManager::new();
        let result = manager.subscribe(String::new(), EventFilter::All, "test".to_string());
        assert!(matches!(result, Err(NotificationError::EmptySubscriberId)));
    }

    #[tokio::test]
    async fn test_subscriber_registration() {
        let mut manager = AsyncNotificationManager::new();

        let _display = manager
            .subscribe(
                "display".to_string(),
                EventFilter::All,
                "cli:display".to_string(),
            )
            .expect("Should subscribe successfully");

        let _lifecycle = manager
            .subscribe(
                "lifecycle".to_string(),
                EventFilter::Lifecycle,
                "cli:waiter".to_string(),
            )
            .expect("Should subscribe successfully");

        assert_eq!(manager.subscriber_count(), 2);
        assert!(manager.has_subscriber("display"));
        assert!(manager.has_subscriber("lifecycle"));
        assert!(!manager.has_subscriber("nonexistent"));
    }

    #[tokio::test]
    async fn test_publish_respects_filters() {
        let mut manager = AsyncNotificationManager::new();

        let mut progress_rx = manager
            .subscribe(
                "progress".to_string(),
                EventFilter::ProgressOnly,
                "test:progress".to_string(),
            )
            .unwrap();

        let mut all_rx = manager
            .subscribe("all".to_string(), EventFilter::All, "test:all".to_string())
            .unwrap();

        manager.publish(progress_event()).unwrap();
        manager
            .publish(Event::Completed(CompletionEvent::new(
                "batch-1".to_string(),
                0,
                None,
            )))
            .unwrap();

        // Progress subscriber sees only the progress event
        let received = progress_rx.recv().await.expect("progress event expected");
        assert!(matches!(received, Event::Progress(_)));
        assert!(progress_rx.try_recv().is_err());

        // All subscriber sees both
        let first = all_rx.recv().await.unwrap();
        let second = all_rx.recv().await.unwrap();
        assert!(matches!(first, Event::Progress(_)));
        assert!(matches!(second, Event::Completed(_)));
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_cleaned_up() {
        let mut manager = AsyncNotificationManager::new();

        let dropped_rx = manager
            .subscribe(
                "dropped".to_string(),
                EventFilter::All,
                "test:dropped".to_string(),
            )
            .unwrap();

        let mut live_rx = manager
            .subscribe("live".to_string(), EventFilter::All, "test:live".to_string())
            .unwrap();

        drop(dropped_rx);

        let result = manager.publish(Event::Error(ErrorEvent::new("boom")));
        match result {
            Err(NotificationError::PublishFailed {
                failed_subscribers, ..
            }) => {
                assert_eq!(failed_subscribers, vec!["dropped".to_string()]);
            }
            other => panic!("Expected PublishFailed, got {other:?}"),
        }

        assert_eq!(manager.subscriber_count(), 1);
        assert!(!manager.has_subscriber("dropped"));

        // The surviving subscriber still received the event
        let received = live_rx.recv().await.unwrap();
        assert!(matches!(received, Event::Error(_)));
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_previous() {
        let mut manager = AsyncNotificationManager::new();

        let _first = manager
            .subscribe(
                "display".to_string(),
                EventFilter::ProgressOnly,
                "test:original".to_string(),
            )
            .unwrap();

        let _second = manager
            .subscribe(
                "display".to_string(),
                EventFilter::All,
                "test:replacement".to_string(),
            )
            .unwrap();

        assert_eq!(manager.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut manager = AsyncNotificationManager::new();
        let _rx = manager
            .subscribe("gone".to_string(), EventFilter::All, "test".to_string())
            .unwrap();

        assert!(manager.unsubscribe("gone"));
        assert!(!manager.unsubscribe("gone"));
        assert_eq!(manager.subscriber_count(), 0);
    }
}
