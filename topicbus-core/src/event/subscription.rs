use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Opaque identifier minted by subscribe and redeemed by unsubscribe.
///
/// Tokens are unique across every topic of the owning bus and are never
/// reused, even after the subscription they belong to has been removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub(crate) u64);

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// One capability: be invoked with the topic name and a payload.
pub trait Handler<P>: Send + Sync {
    fn handle(&self, topic: &str, payload: &P) -> anyhow::Result<()>;
}

impl<P, F> Handler<P> for F
    where
        F: Fn(&str, &P) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, topic: &str, payload: &P) -> anyhow::Result<()> {
        self(topic, payload)
    }
}

pub(crate) struct Subscription<P: 'static> {
    pub(crate) token: Token,
    pub(crate) handler: Arc<dyn Handler<P>>,
}

impl<P: 'static> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            handler: self.handler.clone(),
        }
    }
}

impl<P: 'static> Debug for Subscription<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::event::subscription::Token;

    #[test]
    fn tokens_order_by_mint_sequence() {
        assert!(Token(1) < Token(2));
        assert_eq!(Token(7).to_string(), "Token(7)");
    }
}
