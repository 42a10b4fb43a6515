//! Topic based publish/subscribe used by elements, managers and the figure.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

type Subscriber = Rc<dyn Fn(&Value)>;

/// Handle returned by [`Notifications::add`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    callback: Subscriber,
    remaining: Option<u32>,
}

#[derive(Default)]
struct Topics {
    next_id: u64,
    topics: HashMap<String, Vec<Subscription>>,
}

/// Cheaply cloneable notification channel. Clones share subscribers.
#[derive(Clone, Default)]
pub struct Notifications {
    inner: Rc<RefCell<Topics>>,
}

impl fmt::Debug for Notifications {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut counts: Vec<_> = inner.topics.iter().map(|(k, v)| (k.clone(), v.len())).collect();
        counts.sort();
        f.debug_struct("Notifications").field("topics", &counts).finish()
    }
}

impl Notifications {
    /// Subscribe to `topic`. With `max` set, the subscription is dropped after that many calls.
    pub fn add(
        &self,
        topic: &str,
        callback: impl Fn(&Value) + 'static,
        max: Option<u32>,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner
            .topics
            .entry(topic.to_owned())
            .or_default()
            .push(Subscription {
                id,
                callback: Rc::new(callback),
                remaining: max,
            });
        id
    }

    pub fn remove(&self, topic: &str, id: SubscriptionId) {
        if let Some(subs) = self.inner.borrow_mut().topics.get_mut(topic) {
            subs.retain(|s| s.id != id);
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.borrow().topics.get(topic).map_or(0, Vec::len)
    }

    /// Call every subscriber of `topic` with `payload`.
    ///
    /// Subscribers run after the channel is released, so they may subscribe or publish.
    pub fn publish(&self, topic: &str, payload: &Value) {
        let to_call: Vec<Subscriber> = {
            let mut inner = self.inner.borrow_mut();
            let Some(subs) = inner.topics.get_mut(topic) else {
                return;
            };
            let callbacks = subs.iter().map(|s| Rc::clone(&s.callback)).collect();
            for s in subs.iter_mut() {
                if let Some(n) = s.remaining.as_mut() {
                    *n = n.saturating_sub(1);
                }
            }
            subs.retain(|s| s.remaining != Some(0));
            callbacks
        };
        tracing::trace!(topic, subscribers = to_call.len(), "publish");
        for callback in to_call {
            callback(payload);
        }
    }

    /// Publish with a `null` payload.
    pub fn notify(&self, topic: &str) {
        self.publish(topic, &Value::Null);
    }
}

#[cfg(test)]
#[path = "../tests/unit/notify/notify.rs"]
mod tests;
