//! Notification store and event channel integration tests.
//!
//! Require a running Redis. Run with:
//! `cargo test -p vidforge-notify -- --ignored`

use futures_util::StreamExt;
use std::time::Duration;

use vidforge_models::{
    GenerationNotification, JobId, MediaId, NotificationStatus, NotificationUpdate, ProviderKind,
    WsMessage,
};
use vidforge_notify::{EventChannel, NotificationStore, NotifyError};

fn store() -> NotificationStore {
    dotenvy::dotenv().ok();
    NotificationStore::from_env().expect("Failed to create store")
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_create_and_transition() {
    let store = store();
    let notification = GenerationNotification::new("test-user-1", "a cat on a skateboard");
    let id = notification.id.clone();

    store.create(&notification).await.expect("create");

    let fetched = store.get(&id).await.expect("get").unwrap();
    assert_eq!(fetched.status, NotificationStatus::Requested);

    let updated = store
        .transition(&id, NotificationUpdate::processing())
        .await
        .expect("transition");
    assert_eq!(updated.status, NotificationStatus::Processing);

    let updated = store
        .transition(
            &id,
            NotificationUpdate::completed(MediaId::from_string("m-1"), None),
        )
        .await
        .expect("transition");
    assert_eq!(updated.status, NotificationStatus::Completed);
    assert_eq!(updated.result_media_id, Some(MediaId::from_string("m-1")));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_backward_transition_rejected_and_record_untouched() {
    let store = store();
    let notification = GenerationNotification::new("test-user-2", "sunset timelapse");
    let id = notification.id.clone();
    store.create(&notification).await.expect("create");

    store
        .transition(&id, NotificationUpdate::failed("provider rejected prompt"))
        .await
        .expect("transition");

    let err = store
        .transition(&id, NotificationUpdate::processing())
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::InvalidTransition(_)));

    let fetched = store.get(&id).await.expect("get").unwrap();
    assert_eq!(fetched.status, NotificationStatus::Failed);
    assert_eq!(
        fetched.error_message.as_deref(),
        Some("provider rejected prompt")
    );
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_transition_missing_notification() {
    let store = store();
    let err = store
        .transition(
            &vidforge_models::NotificationId::from_string("does-not-exist"),
            NotificationUpdate::processing(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_event_publish_subscribe_roundtrip() {
    dotenvy::dotenv().ok();
    let channel = EventChannel::from_env().expect("channel");
    let user_id = format!("test-user-{}", uuid::Uuid::new_v4());
    let job_id = JobId::new();

    let mut stream = channel.subscribe(&user_id).await.expect("subscribe");

    channel
        .started(&user_id, &job_id, ProviderKind::Kling)
        .await
        .expect("publish");

    let event = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended");

    assert_eq!(event.user_id, user_id);
    match event.message {
        WsMessage::GenerationStarted { job_id: id, provider } => {
            assert_eq!(id, job_id);
            assert_eq!(provider, ProviderKind::Kling);
        }
        other => panic!("unexpected message: {:?}", other),
    }
}
