use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::config::bus_config::{BusConfig, DeliveryOrder, FailurePolicy};
use crate::error::{BusError, Result};
use crate::event::subscription::{Handler, Subscription, Token};
use crate::event::EventBus;

/// Registry mapping topic names to ordered subscription lists.
///
/// Producers and consumers are decoupled through named channels: a consumer
/// registers a [`Handler`] under a topic name and receives every payload
/// published under that name until it redeems its [`Token`]. Topics come into
/// existence on first subscribe and disappear once their last subscription is
/// removed.
///
/// Publish walks a snapshot of the subscription list taken at call entry, so
/// a handler may subscribe, unsubscribe, or publish on the same bus without
/// deadlocking and without changing which handlers the in-flight publish
/// invokes.
pub struct TopicBus<P: 'static> {
    config: BusConfig,
    next_token: AtomicU64,
    subscriptions: DashMap<String, Vec<Subscription<P>>>,
}

impl<P: 'static> TopicBus<P> {
    pub fn new() -> Self {
        TopicBus::default()
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            next_token: AtomicU64::new(1),
            subscriptions: DashMap::new(),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Registers `handler` under `topic`, creating the topic on first use.
    ///
    /// The returned token is never equal to any token issued before by this
    /// bus, not even one whose subscription has since been removed.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> Result<Token>
        where
            F: Fn(&str, &P) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(topic.into(), Arc::new(handler))
    }

    fn register(&self, topic: String, handler: Arc<dyn Handler<P>>) -> Result<Token> {
        if topic.trim().is_empty() {
            return Err(BusError::InvalidTopic(topic));
        }
        let token = Token(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut subscriptions = match self.subscriptions.entry(topic) {
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(vacant) => {
                debug!("topic {} created on first subscribe", vacant.key());
                vacant.insert(Vec::new())
            }
        };
        subscriptions.push(Subscription { token, handler });
        trace!("{} subscribed to {}", token, subscriptions.key());
        Ok(token)
    }

    /// Synchronously invokes every handler subscribed to `topic` at call
    /// entry, passing `(topic, payload)` in the configured [`DeliveryOrder`].
    ///
    /// Returns `false` without invoking anything when the topic has no
    /// subscriptions, `true` otherwise, regardless of how many handlers
    /// succeeded. Handler errors follow the configured [`FailurePolicy`];
    /// the default [`FailurePolicy::ContinueOnError`] attempts every
    /// snapshotted handler exactly once and logs each failure. Handler panics
    /// are not caught.
    pub fn publish(&self, topic: &str, payload: &P) -> bool {
        let snapshot = match self.snapshot(topic) {
            Some(snapshot) => snapshot,
            None => return false,
        };
        let ordered: Box<dyn Iterator<Item = &Subscription<P>>> = match self.config.delivery_order {
            DeliveryOrder::Oldest => Box::new(snapshot.iter()),
            DeliveryOrder::Newest => Box::new(snapshot.iter().rev()),
        };
        for subscription in ordered {
            match subscription.handler.handle(topic, payload) {
                Ok(()) => {
                    trace!("publish on {} delivered to {}", topic, subscription.token);
                }
                Err(error) => {
                    warn!("{} failed handling publish on {}: {:?}", subscription.token, topic, error);
                    if self.config.failure_policy == FailurePolicy::StopOnError {
                        break;
                    }
                }
            }
        }
        true
    }

    // Clones the list (cheap Arc bumps) and releases the shard guard before
    // any handler runs, so handlers can call back into the bus.
    fn snapshot(&self, topic: &str) -> Option<Vec<Subscription<P>>> {
        self.subscriptions
            .get(topic)
            .filter(|subscriptions| !subscriptions.is_empty())
            .map(|subscriptions| subscriptions.value().clone())
    }

    /// Removes the subscription matching `token`, searching every topic.
    ///
    /// An unknown or already-redeemed token is a no-op returning `None`, not
    /// an error.
    pub fn unsubscribe(&self, token: Token) -> Option<Token> {
        let topic = self.subscriptions.iter().find_map(|entry| {
            entry
                .value()
                .iter()
                .any(|subscription| subscription.token == token)
                .then(|| entry.key().clone())
        })?;
        let mut removed = None;
        if let Entry::Occupied(mut occupied) = self.subscriptions.entry(topic) {
            let index = occupied
                .get()
                .iter()
                .position(|subscription| subscription.token == token);
            if let Some(index) = index {
                occupied.get_mut().remove(index);
                trace!("{} unsubscribed from {}", token, occupied.key());
                removed = Some(token);
            }
            if occupied.get().is_empty() {
                debug!("topic {} has no subscribers left, dropping it", occupied.key());
                occupied.remove();
            }
        }
        removed
    }

    /// Drops every subscription of `topic`, returning how many were removed.
    pub fn unsubscribe_all(&self, topic: &str) -> usize {
        match self.subscriptions.remove(topic) {
            Some((topic, subscriptions)) => {
                debug!("removed all {} subscribers of {}", subscriptions.len(), topic);
                subscriptions.len()
            }
            None => 0,
        }
    }

    /// Names of topics currently holding at least one subscription.
    pub fn topics(&self) -> Vec<String> {
        self.subscriptions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .get(topic)
            .map(|subscriptions| subscriptions.value().len())
            .unwrap_or(0)
    }

    /// Total live subscriptions across all topics.
    pub fn len(&self) -> usize {
        self.subscriptions.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: 'static> Default for TopicBus<P> {
    fn default() -> Self {
        TopicBus::with_config(BusConfig::default())
    }
}

impl<P: 'static> Debug for TopicBus<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let topics = self.subscriptions.iter().map(|entry| entry.key().clone()).collect::<Vec<_>>();
        f.debug_struct("TopicBus")
            .field("config", &self.config)
            .field("topics", &topics)
            .finish_non_exhaustive()
    }
}

impl<P: 'static> EventBus for TopicBus<P> {
    type Event = P;
    type Classifier = String;
    type Subscriber = Box<dyn Handler<P>>;
    type Token = Token;

    fn subscribe(&self, subscriber: Self::Subscriber, to: Self::Classifier) -> Result<Self::Token> {
        self.register(to, Arc::from(subscriber))
    }

    fn unsubscribe(&self, token: Self::Token) -> Option<Self::Token> {
        TopicBus::unsubscribe(self, token)
    }

    fn unsubscribe_all(&self, from: Self::Classifier) -> usize {
        TopicBus::unsubscribe_all(self, &from)
    }

    fn publish(&self, event: &Self::Event, to: Self::Classifier) -> bool {
        TopicBus::publish(self, &to, event)
    }
}
