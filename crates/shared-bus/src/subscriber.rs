//! # Subscriptions
//!
//! Receiving half of the bus: a filtered [`Subscription`] and its `Stream`
//! form.

use crate::events::{EventFilter, FusionEvent};
use crate::publisher::BusCounters;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

/// Subscription failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Filtered view of the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<FusionEvent>,
    filter: EventFilter,
    counters: Arc<BusCounters>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<FusionEvent>,
        filter: EventFilter,
        counters: Arc<BusCounters>,
    ) -> Self {
        Self {
            receiver,
            filter,
            counters,
        }
    }

    /// Wait for the next accepted event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<FusionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next accepted event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<FusionEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Every accepted event buffered right now, oldest first.
    pub fn drain(&mut self) -> Vec<FusionEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Filter applied to this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Turn into a `Stream` of accepted events.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.receiver),
            filter: self.filter,
            counters: self.counters,
        }
    }

    fn lagged(&self, skipped: u64) {
        warn!(skipped, "[bus] subscription fell behind");
        self.counters.record_lag(skipped);
    }
}

/// Stream form of a [`Subscription`]. Ends when the bus is dropped.
pub struct EventStream {
    inner: BroadcastStream<FusionEvent>,
    filter: EventFilter,
    counters: Arc<BusCounters>,
}

impl EventStream {
    /// Filter applied to this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = FusionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) if self.filter.matches(&event) => {
                    return Poll::Ready(Some(event))
                }
                Poll::Ready(Some(Ok(_))) => {}
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "[bus] stream fell behind");
                    self.counters.record_lag(skipped);
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
