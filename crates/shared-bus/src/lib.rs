//! # Shared Bus
//!
//! State-change notifications for the card-fusion stack. The engine
//! binding, signature cache, registry and controller publish
//! [`FusionEvent`]s; views, tools and tests subscribe with an
//! [`EventFilter`].
//!
//! ```text
//!  cf-01 ─┐
//!  cf-02 ─┤  publish()   ┌──────────────────┐  subscribe(filter)
//!  cf-03 ─┼────────────► │ InMemoryEventBus │ ──────────────────► Subscription / EventStream
//!  cf-04 ─┘              └──────────────────┘
//! ```
//!
//! Delivery never blocks a publisher. A subscription that falls behind
//! skips the oldest events and the skip is counted in [`BusStats`].

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{component, EventFilter, EventTopic, FusionEvent};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events buffered per subscription before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
