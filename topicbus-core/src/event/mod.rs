use crate::error::Result;

pub mod subscription;
pub mod topic_bus;

/// Classified event bus: subscribers register interest under a classifier and
/// receive every event later published under it, until they redeem the token
/// their registration returned.
pub trait EventBus {
    type Event;

    type Classifier;

    type Subscriber;

    type Token;

    fn subscribe(&self, subscriber: Self::Subscriber, to: Self::Classifier) -> Result<Self::Token>;

    fn unsubscribe(&self, token: Self::Token) -> Option<Self::Token>;

    fn unsubscribe_all(&self, from: Self::Classifier) -> usize;

    fn publish(&self, event: &Self::Event, to: Self::Classifier) -> bool;
}
