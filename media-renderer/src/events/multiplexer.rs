use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use super::{decode_transitions, EventKind, PlaybackEvent, RefCount};
use crate::channel::{DeviceControlChannel, Notification, NotificationHandler, SubscriptionId};
use crate::error::Result;
use crate::service::Service;

type Listener = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

/// Handle for removing a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

/// Listener table and decoding state reached from the channel's handler
struct Dispatcher {
    listeners: Mutex<Vec<Registration>>,
    received_snapshot: AtomicBool,
    next_id: AtomicU64,
}

impl Dispatcher {
    fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            received_snapshot: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    fn register(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Registration { id, kind, listener });
        id
    }

    fn unregister(&self, id: ListenerId) -> Option<EventKind> {
        let mut listeners = self.listeners.lock();
        let index = listeners.iter().position(|r| r.id == id)?;
        Some(listeners.remove(index).kind)
    }

    fn dispatch(&self, notification: &Notification) {
        self.emit(&PlaybackEvent::Status(notification.clone()));

        // The first notification of a subscription is the full state
        // snapshot, not a transition
        if !self.received_snapshot.swap(true, Ordering::AcqRel) {
            debug!(variables = notification.len(), "received initial state snapshot");
            return;
        }

        for event in decode_transitions(notification) {
            self.emit(&event);
        }
    }

    fn emit(&self, event: &PlaybackEvent) {
        let kind = event.kind();
        // Listeners run outside the lock so they may add or remove listeners
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

#[derive(Default)]
struct SubscriptionState {
    refs: RefCount,
    subscription: Option<SubscriptionId>,
}

/// Reference-counted AVTransport subscription shared by all event listeners
///
/// One counter spans all six event kinds. The first listener of any kind
/// subscribes and the last one removed unsubscribes. Edges are serialized, so
/// concurrent registrations never subscribe twice.
pub struct EventMultiplexer<C: ?Sized> {
    channel: Arc<C>,
    dispatcher: Arc<Dispatcher>,
    state: AsyncMutex<SubscriptionState>,
}

impl<C> EventMultiplexer<C>
where
    C: DeviceControlChannel + ?Sized,
{
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            channel,
            dispatcher: Arc::new(Dispatcher::new()),
            state: AsyncMutex::new(SubscriptionState::default()),
        }
    }

    /// Register `listener` for events of `kind`
    ///
    /// The first registration subscribes to AVTransport notifications. If
    /// that subscription fails the registration is rolled back and the error
    /// returned.
    pub async fn add_listener<F>(&self, kind: EventKind, listener: F) -> Result<ListenerId>
    where
        F: Fn(&PlaybackEvent) + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        let id = self.dispatcher.register(kind, Arc::new(listener));
        let count = state.refs.acquire();
        debug!(event = kind.name(), %id, count, "listener added");

        if count == 1 {
            self.dispatcher.received_snapshot.store(false, Ordering::Release);
            let dispatcher = Arc::clone(&self.dispatcher);
            let handler: NotificationHandler = Arc::new(move |notification: &Notification| {
                dispatcher.dispatch(notification);
            });

            match self.channel.subscribe(Service::AVTransport, handler).await {
                Ok(subscription) => {
                    info!(%subscription, "subscribed to AVTransport notifications");
                    state.subscription = Some(subscription);
                }
                Err(e) => {
                    warn!(error = %e, "AVTransport subscription failed, dropping listener");
                    self.dispatcher.unregister(id);
                    state.refs.release();
                    return Err(e);
                }
            }
        }

        Ok(id)
    }

    /// Remove a listener and return the remaining listener count
    ///
    /// Removing the last listener unsubscribes. An unsubscribe failure is
    /// returned, but the subscription is forgotten either way.
    pub async fn remove_listener(&self, id: ListenerId) -> Result<usize> {
        let mut state = self.state.lock().await;
        let Some(kind) = self.dispatcher.unregister(id) else {
            warn!(%id, "attempted to remove unknown listener");
            return Ok(state.refs.get());
        };

        let count = state.refs.release();
        debug!(event = kind.name(), %id, count, "listener removed");

        if count == 0 {
            if let Some(subscription) = state.subscription.take() {
                self.channel.unsubscribe(Service::AVTransport, subscription).await?;
                info!(%subscription, "unsubscribed from AVTransport notifications");
            }
        }

        Ok(count)
    }

    /// Register a listener that forwards events of `kind` into a channel
    ///
    /// The listener stays registered after the receiver is dropped; remove it
    /// with the returned id.
    pub async fn listen(&self, kind: EventKind) -> Result<(ListenerId, mpsc::UnboundedReceiver<PlaybackEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self
            .add_listener(kind, move |event| {
                let _ = tx.send(event.clone());
            })
            .await?;
        Ok((id, rx))
    }

    /// Current value of the shared listener count
    pub async fn listener_count(&self) -> usize {
        self.state.lock().await.refs.get()
    }

    pub async fn is_subscribed(&self) -> bool {
        self.state.lock().await.subscription.is_some()
    }
}
