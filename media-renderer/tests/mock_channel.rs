//! Scripted in-memory device control channel for testing.
//!
//! Responses are queued per action name; an action without a queued
//! response succeeds with no output arguments. Every invocation is recorded,
//! subscribe/unsubscribe calls are counted, and the most recent notification
//! handler is kept so tests can push notifications as if the device sent them.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use media_renderer::{
    ActionArgs, ActionResponse, DeviceControlChannel, Notification, NotificationHandler, RendererError, Result, Service,
    SubscriptionId,
};
use parking_lot::Mutex;

/// Outcome returned for one invocation of an action
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(ActionResponse),
    NotImplemented,
    Fault(u16, String),
    Network(String),
}

/// A recorded action invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub service: Service,
    pub action: String,
    pub args: ActionArgs,
}

impl Invocation {
    pub fn arg(&self, name: &str) -> Option<Option<&str>> {
        self.args.get(name)
    }
}

#[derive(Default)]
pub struct MockChannel {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    invocations: Mutex<Vec<Invocation>>,
    handler: Mutex<Option<(SubscriptionId, NotificationHandler)>>,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next `action` invocation
    pub fn script(&self, action: &str, outcome: Scripted) {
        self.scripts
            .lock()
            .entry(action.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Queue a successful response built from `fields`
    pub fn respond(&self, action: &str, fields: &[(&str, &str)]) {
        let response = fields.iter().map(|(k, v)| (*k, *v)).collect();
        self.script(action, Scripted::Ok(response));
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Names of the invoked actions, in order
    pub fn actions(&self) -> Vec<String> {
        self.invocations.lock().iter().map(|i| i.action.clone()).collect()
    }

    /// Most recent invocation of `action`
    pub fn last(&self, action: &str) -> Option<Invocation> {
        self.invocations.lock().iter().rev().find(|i| i.action == action).cloned()
    }

    pub fn clear_invocations(&self) {
        self.invocations.lock().clear();
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver a notification to the live subscription; false if there is none
    pub fn notify(&self, fields: &[(&str, &str)]) -> bool {
        let notification: Notification = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let handler = self.handler.lock().as_ref().map(|(_, h)| h.clone());
        match handler {
            Some(handler) => {
                handler(&notification);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DeviceControlChannel for MockChannel {
    async fn invoke_action(&self, service: Service, action: &str, args: ActionArgs) -> Result<ActionResponse> {
        self.invocations.lock().push(Invocation {
            service,
            action: action.to_string(),
            args,
        });

        let outcome = self
            .scripts
            .lock()
            .get_mut(action)
            .and_then(|queue| queue.pop_front());

        match outcome {
            None => Ok(ActionResponse::new()),
            Some(Scripted::Ok(response)) => Ok(response),
            Some(Scripted::NotImplemented) => Err(RendererError::ActionNotSupported {
                service,
                action: action.to_string(),
            }),
            Some(Scripted::Fault(code, description)) => Err(RendererError::Fault {
                action: action.to_string(),
                code,
                description,
            }),
            Some(Scripted::Network(message)) => Err(RendererError::Network(message)),
        }
    }

    async fn subscribe(&self, service: Service, handler: NotificationHandler) -> Result<SubscriptionId> {
        assert_eq!(service, Service::AVTransport);
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(RendererError::Subscription("device refused SUBSCRIBE".to_string()));
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        *self.handler.lock() = Some((id, handler));
        Ok(id)
    }

    async fn unsubscribe(&self, service: Service, subscription: SubscriptionId) -> Result<()> {
        assert_eq!(service, Service::AVTransport);
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let mut handler = self.handler.lock();
        match handler.as_ref() {
            Some((id, _)) if *id == subscription => {}
            _ => return Err(RendererError::Subscription(format!("unknown {}", subscription))),
        }
        *handler = None;

        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(RendererError::Subscription("device refused UNSUBSCRIBE".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_are_consumed_in_order() {
        let channel = MockChannel::new();
        channel.respond("GetVolume", &[("CurrentVolume", "10")]);
        channel.script("GetVolume", Scripted::NotImplemented);

        let first = channel
            .invoke_action(Service::RenderingControl, "GetVolume", ActionArgs::new())
            .await
            .unwrap();
        assert_eq!(first.get("CurrentVolume"), Some("10"));

        let second = channel
            .invoke_action(Service::RenderingControl, "GetVolume", ActionArgs::new())
            .await;
        assert!(second.unwrap_err().is_action_not_supported());

        let third = channel
            .invoke_action(Service::RenderingControl, "GetVolume", ActionArgs::new())
            .await
            .unwrap();
        assert!(third.fields().is_empty());
        assert_eq!(channel.actions(), ["GetVolume", "GetVolume", "GetVolume"]);
    }
}
