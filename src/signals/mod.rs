//! Signals - passive observer bus for core events
//!
//! The core never calls UI code. Whoever cares about generation results
//! (UI, analytics, the Bevy adapter) subscribes to a [`SignalBus`].
//!
//! Wire names:
//! - `combination:generated`
//! - `category:selected`
//! - `letter:generated`

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::generation::Combination;

/// Event emitted by the generators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    CombinationGenerated {
        combination: Box<Combination>,
        timestamp: DateTime<Utc>,
    },
    CategorySelected {
        category_id: String,
        category_name: String,
        difficulty: u8,
        timestamp: DateTime<Utc>,
    },
    LetterGenerated {
        letter: char,
        strategy: String,
        timestamp: DateTime<Utc>,
    },
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::CombinationGenerated { .. } => "combination:generated",
            Signal::CategorySelected { .. } => "category:selected",
            Signal::LetterGenerated { .. } => "letter:generated",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Signal::CombinationGenerated { timestamp, .. }
            | Signal::CategorySelected { timestamp, .. }
            | Signal::LetterGenerated { timestamp, .. } => *timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&Signal) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

/// Shared fan-out of [`Signal`]s. Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct SignalBus {
    inner: Arc<RwLock<BusInner>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&Signal) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(subscriber)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
        inner.subscribers.len() != before
    }

    /// Deliver to every subscriber. Subscribers may (un)subscribe from
    /// inside the callback; changes apply from the next emit.
    pub fn emit(&self, signal: Signal) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, sub)| sub.clone())
            .collect();

        for subscriber in subscribers {
            subscriber(&signal);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
