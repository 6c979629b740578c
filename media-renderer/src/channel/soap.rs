//! SOAP control and GENA eventing over HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::Mutex;
use soap_client::{output_arguments, SoapClient, SoapError};
use tracing::{debug, info, warn};

use super::{
    parse_property_set, ActionArgs, ActionResponse, DeviceControlChannel, Notification, NotificationHandler,
    SubscriptionId,
};
use crate::config::ChannelConfig;
use crate::error::{RendererError, Result};
use crate::service::Service;

/// UPnP error codes meaning "this device does not implement the action"
const INVALID_ACTION: u16 = 401;
const OPTIONAL_ACTION_NOT_IMPLEMENTED: u16 = 602;

/// Subscriptions expiring within this window are due for renewal
const RENEWAL_THRESHOLD: Duration = Duration::from_secs(300);

/// Distinct unknown SIDs whose notifications are held for a pending SUBSCRIBE
const MAX_PARKED_SIDS: usize = 8;

/// Notifications held per unknown SID
const MAX_PARKED_PER_SID: usize = 4;

struct GenaSubscription {
    service: Service,
    sid: String,
    timeout_seconds: u32,
    expires_at: SystemTime,
    handler: NotificationHandler,
}

impl GenaSubscription {
    fn grant(&mut self, timeout_seconds: u32) {
        self.timeout_seconds = timeout_seconds;
        self.expires_at = expiry(timeout_seconds);
    }
}

fn expiry(timeout_seconds: u32) -> SystemTime {
    SystemTime::now() + Duration::from_secs(u64::from(timeout_seconds))
}

/// Time left before `expires_at` once it falls inside the renewal window
///
/// `None` while renewal is not yet due, `Some(Duration::ZERO)` once expired.
fn renewal_due(expires_at: SystemTime, now: SystemTime) -> Option<Duration> {
    match expires_at.duration_since(now) {
        Err(_) => Some(Duration::ZERO),
        Ok(left) if left <= RENEWAL_THRESHOLD => Some(left),
        Ok(_) => None,
    }
}

/// [`DeviceControlChannel`] speaking SOAP and GENA to a real device
///
/// Action calls run the blocking HTTP client on Tokio's blocking pool.
/// Notifications are not received here: the embedding application runs the
/// HTTP server behind `callback_url` and forwards every NOTIFY request to
/// [`handle_notify`](Self::handle_notify).
///
/// A device may send its initial NOTIFY before the SUBSCRIBE response has
/// been processed. Notifications for a SID nobody holds yet are parked and
/// delivered, in arrival order, when the subscription carrying that SID is
/// recorded.
pub struct SoapControlChannel {
    soap: SoapClient,
    config: Arc<ChannelConfig>,
    next_id: AtomicU64,
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, GenaSubscription>>>,
    // Locked only while `subscriptions` is held
    parked: Mutex<HashMap<String, Vec<Notification>>>,
}

impl SoapControlChannel {
    /// Create a channel for the device described by `config`
    pub fn new(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        let soap = SoapClient::with_timeouts(config.connect_timeout, config.read_timeout);

        Ok(Self {
            soap,
            config: Arc::new(config),
            next_id: AtomicU64::new(1),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            parked: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Number of live GENA subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Device-assigned SID of a subscription, as it appears in NOTIFY requests
    pub fn sid(&self, subscription: SubscriptionId) -> Option<String> {
        self.subscriptions.lock().get(&subscription).map(|s| s.sid.clone())
    }

    /// Deliver the body of a NOTIFY request received for `sid`
    ///
    /// A SID with no recorded subscription is parked for a SUBSCRIBE still in
    /// flight. Fails once too many unknown SIDs, or too many notifications
    /// for one of them, are waiting.
    pub fn handle_notify(&self, sid: &str, body: &str) -> Result<()> {
        let notification = parse_property_set(body)?;

        let handler = {
            let subscriptions = self.subscriptions.lock();
            match subscriptions.values().find(|s| s.sid == sid) {
                Some(subscription) => Arc::clone(&subscription.handler),
                None => return self.park(sid, notification),
            }
        };

        debug!(sid, variables = notification.len(), "dispatching notification");
        handler(&notification);
        Ok(())
    }

    fn park(&self, sid: &str, notification: Notification) -> Result<()> {
        let mut parked = self.parked.lock();
        if !parked.contains_key(sid) && parked.len() >= MAX_PARKED_SIDS {
            return Err(RendererError::Subscription(format!("no subscription with SID {}", sid)));
        }

        let queue = parked.entry(sid.to_string()).or_default();
        if queue.len() >= MAX_PARKED_PER_SID {
            return Err(RendererError::Subscription(format!(
                "too many notifications waiting for SID {}",
                sid
            )));
        }
        queue.push(notification);
        debug!(sid, waiting = queue.len(), "parked notification for unknown SID");
        Ok(())
    }

    /// Number of unknown SIDs with parked notifications
    pub fn parked_sid_count(&self) -> usize {
        self.parked.lock().len()
    }

    /// Renew every live subscription with the configured timeout
    ///
    /// Stops at the first failure; subscriptions renewed before it keep
    /// their new timeout.
    pub async fn renew_subscriptions(&self) -> Result<()> {
        let pending: Vec<(SubscriptionId, Service, String)> = self
            .subscriptions
            .lock()
            .iter()
            .map(|(id, s)| (*id, s.service, s.sid.clone()))
            .collect();

        let requested = self.config.subscription_timeout_secs();
        for (id, service, sid) in pending {
            let soap = self.soap.clone();
            let event_url = self.config.event_url(service);
            let granted = run_blocking(move || soap.renew_subscription(&event_url, &sid, requested))
                .await?
                .map_err(|e| RendererError::Subscription(format!("renewing {} failed: {}", service.name(), e)))?;

            if let Some(subscription) = self.subscriptions.lock().get_mut(&id) {
                subscription.grant(granted);
            }
            debug!(service = service.name(), %id, granted, "renewed subscription");
        }
        Ok(())
    }

    /// Timeout the device granted for a subscription, in seconds
    pub fn granted_timeout(&self, subscription: SubscriptionId) -> Option<u32> {
        self.subscriptions.lock().get(&subscription).map(|s| s.timeout_seconds)
    }

    /// When a subscription lapses unless renewed
    pub fn expires_at(&self, subscription: SubscriptionId) -> Option<SystemTime> {
        self.subscriptions.lock().get(&subscription).map(|s| s.expires_at)
    }

    /// Time left on a subscription once it is within five minutes of expiry
    ///
    /// `None` for unknown subscriptions and for those not yet due.
    pub fn time_until_renewal(&self, subscription: SubscriptionId) -> Option<Duration> {
        let expires_at = self.expires_at(subscription)?;
        renewal_due(expires_at, SystemTime::now())
    }

    /// Whether any live subscription is due for [`renew_subscriptions`](Self::renew_subscriptions)
    pub fn needs_renewal(&self) -> bool {
        let now = SystemTime::now();
        self.subscriptions
            .lock()
            .values()
            .any(|s| renewal_due(s.expires_at, now).is_some())
    }
}

#[async_trait]
impl DeviceControlChannel for SoapControlChannel {
    async fn invoke_action(&self, service: Service, action: &str, args: ActionArgs) -> Result<ActionResponse> {
        let soap = self.soap.clone();
        let control_url = self.config.control_url(service);
        let action_name = action.to_string();
        let arguments = args.into_entries();

        let result = run_blocking(move || {
            soap.call(&control_url, service.urn(), &action_name, &arguments)
                .map(|response| output_arguments(&response))
        })
        .await?;

        match result {
            Ok(fields) => Ok(fields.into_iter().collect()),
            Err(error) => Err(map_action_error(service, action, error)),
        }
    }

    async fn subscribe(&self, service: Service, handler: NotificationHandler) -> Result<SubscriptionId> {
        let callback_url = self.config.callback_url.clone().ok_or_else(|| {
            RendererError::Configuration("callback_url is required to subscribe to events".to_string())
        })?;

        let soap = self.soap.clone();
        let event_url = self.config.event_url(service);
        let timeout = self.config.subscription_timeout_secs();
        let response = run_blocking(move || soap.subscribe(&event_url, &callback_url, timeout))
            .await?
            .map_err(|e| RendererError::Subscription(format!("subscribing to {} failed: {}", service.name(), e)))?;

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        info!(
            service = service.name(),
            sid = %response.sid,
            timeout = response.timeout_seconds,
            "subscribed to device events"
        );

        // Notifications keep parking until the queue for this SID is empty, so
        // early ones reach the handler before anything routed to it directly.
        let mut entry = Some(GenaSubscription {
            service,
            sid: response.sid.clone(),
            timeout_seconds: response.timeout_seconds,
            expires_at: expiry(response.timeout_seconds),
            handler: Arc::clone(&handler),
        });
        while let Some(subscription) = entry.take() {
            let early = {
                let mut subscriptions = self.subscriptions.lock();
                match self.parked.lock().remove(&response.sid) {
                    Some(early) => {
                        entry = Some(subscription);
                        early
                    }
                    None => {
                        subscriptions.insert(id, subscription);
                        Vec::new()
                    }
                }
            };

            if !early.is_empty() {
                debug!(sid = %response.sid, count = early.len(), "delivering notifications received before SUBSCRIBE completed");
            }
            for notification in &early {
                handler(notification);
            }
        }
        Ok(id)
    }

    async fn unsubscribe(&self, service: Service, subscription: SubscriptionId) -> Result<()> {
        let removed = self.subscriptions.lock().remove(&subscription);
        let Some(entry) = removed else {
            warn!(%subscription, "unsubscribe for unknown subscription");
            return Err(RendererError::Subscription(format!("unknown {}", subscription)));
        };

        let soap = self.soap.clone();
        let event_url = self.config.event_url(service);
        let sid = entry.sid;
        run_blocking(move || soap.unsubscribe(&event_url, &sid))
            .await?
            .map_err(|e| RendererError::Subscription(format!("unsubscribing from {} failed: {}", service.name(), e)))?;

        info!(service = service.name(), %subscription, "unsubscribed from device events");
        Ok(())
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RendererError::Network(format!("HTTP worker failed: {}", e)))
}

fn map_action_error(service: Service, action: &str, error: SoapError) -> RendererError {
    match error {
        SoapError::Fault { code, .. } if code == INVALID_ACTION || code == OPTIONAL_ACTION_NOT_IMPLEMENTED => {
            RendererError::ActionNotSupported {
                service,
                action: action.to_string(),
            }
        }
        SoapError::Fault { code, description } => RendererError::Fault {
            action: action.to_string(),
            code,
            description,
        },
        other => other.into(),
    }
}
