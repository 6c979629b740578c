//! Event subscription multiplexing against a scripted channel.

mod mock_channel;

use std::sync::Arc;

use media_renderer::{EventKind, MediaRendererClient, PlaybackEvent, RendererError};
use mock_channel::MockChannel;
use parking_lot::Mutex;

type Recorded = Arc<Mutex<Vec<PlaybackEvent>>>;

fn client() -> (Arc<MockChannel>, MediaRendererClient<MockChannel>) {
    let channel = Arc::new(MockChannel::new());
    let client = MediaRendererClient::from_arc(Arc::clone(&channel));
    (channel, client)
}

fn recorder() -> (Recorded, impl Fn(&PlaybackEvent) + Send + Sync + Clone + 'static) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |event: &PlaybackEvent| sink.lock().push(event.clone()))
}

#[tokio::test]
async fn test_shared_count_subscribes_once() {
    let (channel, client) = client();

    let playing = client.on(EventKind::Playing, |_| {}).await.unwrap();
    let paused = client.on(EventKind::Paused, |_| {}).await.unwrap();
    assert_eq!(channel.subscribe_calls(), 1);
    assert_eq!(client.events().listener_count().await, 2);

    assert_eq!(client.off(playing).await.unwrap(), 1);
    assert_eq!(channel.unsubscribe_calls(), 0);
    assert_eq!(client.off(paused).await.unwrap(), 0);
    assert_eq!(channel.unsubscribe_calls(), 1);
    assert!(!client.events().is_subscribed().await);

    let again = client.on(EventKind::Stopped, |_| {}).await.unwrap();
    assert_eq!(channel.subscribe_calls(), 2);
    assert!(channel.is_subscribed());

    client.off(again).await.unwrap();
    assert_eq!(channel.unsubscribe_calls(), 2);
}

#[tokio::test]
async fn test_concurrent_registrations_subscribe_once() {
    let (channel, client) = client();

    let (a, b, c) = tokio::join!(
        client.on(EventKind::Status, |_| {}),
        client.on(EventKind::Loading, |_| {}),
        client.on(EventKind::SpeedChanged, |_| {}),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(channel.subscribe_calls(), 1);
    assert_eq!(client.events().listener_count().await, 3);
}

#[tokio::test]
async fn test_concurrent_removals_unsubscribe_once() {
    let (channel, client) = client();
    let a = client.on(EventKind::Playing, |_| {}).await.unwrap();
    let b = client.on(EventKind::Stopped, |_| {}).await.unwrap();

    let (left_a, left_b) = tokio::join!(client.off(a), client.off(b));
    let mut remaining = [left_a.unwrap(), left_b.unwrap()];
    remaining.sort_unstable();

    assert_eq!(remaining, [0, 1]);
    assert_eq!(channel.subscribe_calls(), 1);
    assert_eq!(channel.unsubscribe_calls(), 1);
    assert!(!channel.is_subscribed());
    assert!(!client.events().is_subscribed().await);
}

#[tokio::test]
async fn test_initial_snapshot_only_emits_status() {
    let (channel, client) = client();
    let (seen, record) = recorder();
    for kind in EventKind::ALL {
        client.on(kind, record.clone()).await.unwrap();
    }

    channel.notify(&[("TransportState", "PLAYING"), ("TransportPlaySpeed", "1")]);

    let events = seen.lock().clone();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], PlaybackEvent::Status(n) if n.get("TransportState").map(String::as_str) == Some("PLAYING")));
}

#[tokio::test]
async fn test_playing_emits_status_and_playing_only() {
    let (channel, client) = client();
    let (seen, record) = recorder();
    for kind in EventKind::ALL {
        client.on(kind, record.clone()).await.unwrap();
    }

    channel.notify(&[("TransportState", "STOPPED")]);
    seen.lock().clear();

    channel.notify(&[("TransportState", "PLAYING")]);

    let events = seen.lock().clone();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PlaybackEvent::Status(_)));
    assert_eq!(events[1], PlaybackEvent::Playing);
}

#[tokio::test]
async fn test_transitions_and_speed() {
    let (channel, client) = client();
    let (seen, record) = recorder();
    for kind in [EventKind::Loading, EventKind::Paused, EventKind::Stopped, EventKind::SpeedChanged] {
        client.on(kind, record.clone()).await.unwrap();
    }

    channel.notify(&[]);
    channel.notify(&[("TransportState", "TRANSITIONING")]);
    channel.notify(&[("TransportState", "PAUSED_PLAYBACK"), ("TransportPlaySpeed", "1/2")]);
    channel.notify(&[("TransportState", "NO_MEDIA_PRESENT")]);
    channel.notify(&[("TransportState", "STOPPED")]);

    assert_eq!(
        *seen.lock(),
        vec![
            PlaybackEvent::Loading,
            PlaybackEvent::Paused,
            PlaybackEvent::SpeedChanged(0.5),
            PlaybackEvent::Stopped,
        ]
    );
}

#[tokio::test]
async fn test_resubscription_expects_a_new_snapshot() {
    let (channel, client) = client();
    let (seen, record) = recorder();

    let first = client.on(EventKind::Playing, record.clone()).await.unwrap();
    channel.notify(&[("TransportState", "STOPPED")]);
    channel.notify(&[("TransportState", "PLAYING")]);
    assert_eq!(seen.lock().len(), 1);
    client.off(first).await.unwrap();

    client.on(EventKind::Playing, record).await.unwrap();
    channel.notify(&[("TransportState", "PLAYING")]);
    assert_eq!(seen.lock().len(), 1);

    channel.notify(&[("TransportState", "PLAYING")]);
    assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn test_listener_only_hears_its_kind() {
    let (channel, client) = client();
    let (seen, record) = recorder();
    client.on(EventKind::Stopped, record).await.unwrap();

    channel.notify(&[("TransportState", "PLAYING")]);
    channel.notify(&[("TransportState", "PLAYING")]);
    channel.notify(&[("TransportState", "STOPPED")]);

    assert_eq!(*seen.lock(), vec![PlaybackEvent::Stopped]);
}

#[tokio::test]
async fn test_subscribe_failure_rolls_back() {
    let (channel, client) = client();
    channel.fail_subscribe(true);

    let err = client.on(EventKind::Playing, |_| {}).await.unwrap_err();
    assert!(matches!(err, RendererError::Subscription(_)));
    assert_eq!(client.events().listener_count().await, 0);
    assert!(!client.events().is_subscribed().await);

    channel.fail_subscribe(false);
    client.on(EventKind::Playing, |_| {}).await.unwrap();
    assert_eq!(channel.subscribe_calls(), 2);
    assert_eq!(client.events().listener_count().await, 1);
}

#[tokio::test]
async fn test_unsubscribe_failure_is_reported() {
    let (channel, client) = client();
    let id = client.on(EventKind::Paused, |_| {}).await.unwrap();
    channel.fail_unsubscribe(true);

    let err = client.off(id).await.unwrap_err();
    assert!(matches!(err, RendererError::Subscription(_)));
    assert_eq!(client.events().listener_count().await, 0);
    assert!(!client.events().is_subscribed().await);

    channel.fail_unsubscribe(false);
    client.on(EventKind::Paused, |_| {}).await.unwrap();
    assert_eq!(channel.subscribe_calls(), 2);
}

#[tokio::test]
async fn test_removing_unknown_listener_changes_nothing() {
    let (channel, client) = client();
    let id = client.on(EventKind::Loading, |_| {}).await.unwrap();
    assert_eq!(client.off(id).await.unwrap(), 0);

    let keep = client.on(EventKind::Loading, |_| {}).await.unwrap();
    assert_eq!(client.off(id).await.unwrap(), 1);
    assert_eq!(channel.unsubscribe_calls(), 1);
    assert!(client.events().is_subscribed().await);

    assert_eq!(client.off(keep).await.unwrap(), 0);
}

#[tokio::test]
async fn test_listen_forwards_into_receiver() {
    let (channel, client) = client();
    let (id, mut rx) = client.events().listen(EventKind::SpeedChanged).await.unwrap();

    channel.notify(&[("TransportPlaySpeed", "1")]);
    channel.notify(&[("TransportPlaySpeed", "2")]);
    channel.notify(&[("TransportPlaySpeed", "-1/2")]);

    assert_eq!(rx.recv().await, Some(PlaybackEvent::SpeedChanged(2.0)));
    assert_eq!(rx.recv().await, Some(PlaybackEvent::SpeedChanged(-0.5)));
    assert!(rx.try_recv().is_err());

    client.events().remove_listener(id).await.unwrap();
    assert_eq!(channel.unsubscribe_calls(), 1);
}
