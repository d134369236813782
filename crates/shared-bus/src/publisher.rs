//! # Event Publisher
//!
//! Publishing half of the bus. Components only ever see
//! [`EventPublisher`]; observers get a [`Subscription`] from the concrete
//! bus.

use crate::events::{EventFilter, FusionEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Publishing port held by every component as `Arc<dyn EventPublisher>`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to every live subscription and return how many there
    /// were. Publishing never waits on a slow subscriber.
    async fn publish(&self, event: FusionEvent) -> usize;
}

/// Counters shared between the bus and its subscriptions.
#[derive(Debug, Default)]
pub(crate) struct BusCounters {
    published: AtomicU64,
    unobserved: AtomicU64,
    lagged: AtomicU64,
}

impl BusCounters {
    pub(crate) fn record_lag(&self, skipped: u64) {
        self.lagged.fetch_add(skipped, Ordering::Relaxed);
    }
}

/// Point-in-time view of the bus counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusStats {
    /// Events handed to the bus.
    pub published: u64,
    /// Events published while nobody was subscribed.
    pub unobserved: u64,
    /// Events skipped by subscriptions that fell behind.
    pub lagged: u64,
    /// Live subscriptions.
    pub subscribers: usize,
}

/// Broadcast-backed bus.
///
/// Every subscription buffers up to `capacity` events. One that falls
/// further behind skips the oldest and the skip shows up in
/// [`BusStats::lagged`].
#[derive(Debug)]
pub struct InMemoryEventBus {
    sender: broadcast::Sender<FusionEvent>,
    counters: Arc<BusCounters>,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering `capacity` events per subscription.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            counters: Arc::new(BusCounters::default()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events accepted by `filter`. Only events published
    /// after this call are seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.counters))
    }

    /// Same as [`subscribe`](Self::subscribe), as a `Stream`.
    #[must_use]
    pub fn stream(&self, filter: EventFilter) -> EventStream {
        self.subscribe(filter).into_stream()
    }

    /// Per-subscription buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.counters.published.load(Ordering::Relaxed),
            unobserved: self.counters.unobserved.load(Ordering::Relaxed),
            lagged: self.counters.lagged.load(Ordering::Relaxed),
            subscribers: self.sender.receiver_count(),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: FusionEvent) -> usize {
        self.counters.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, receivers, "[bus] event published");
                receivers
            }
            Err(_) => {
                self.counters.unobserved.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use shared_types::CardId;

    fn minted(id: u64) -> FusionEvent {
        FusionEvent::CardMinted { card_id: CardId(id) }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_counted() {
        let bus = InMemoryEventBus::new();

        assert_eq!(bus.publish(minted(1)).await, 0);
        let stats = bus.stats();
        assert_eq!((stats.published, stats.unobserved), (1, 1));
    }

    #[tokio::test]
    async fn test_every_subscription_receives_a_copy() {
        let bus = InMemoryEventBus::new();
        let _all = bus.subscribe(EventFilter::all());
        let _engine = bus.subscribe(EventFilter::topics(vec![EventTopic::Engine]));

        // Filtering is per subscription, delivery is not
        assert_eq!(bus.publish(minted(1)).await, 2);
        assert_eq!(bus.stats().subscribers, 2);
        assert_eq!(bus.stats().unobserved, 0);
    }

    #[tokio::test]
    async fn test_slow_subscription_lags_instead_of_blocking() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::all());

        for id in 1..=5 {
            bus.publish(minted(id)).await;
        }

        assert!(matches!(
            sub.try_recv(),
            Ok(Some(FusionEvent::CardMinted { card_id: CardId(4) }))
        ));
        assert_eq!(bus.stats().lagged, 3);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let bus = InMemoryEventBus::with_capacity(0);
        assert_eq!(bus.capacity(), 1);
        assert_eq!(InMemoryEventBus::default().capacity(), DEFAULT_CHANNEL_CAPACITY);
    }
}
