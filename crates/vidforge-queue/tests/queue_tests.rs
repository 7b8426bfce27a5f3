//! Queue integration tests.
//!
//! These tests require a running Redis. Run with:
//! `cargo test -p vidforge-queue -- --ignored`

use std::time::Duration;

use vidforge_models::{GenerateVideoJob, JobState, MediaId, ProviderKind};
use vidforge_queue::{FailureDisposition, JobQueue, QueueConfig};

fn test_queue(suffix: &str) -> JobQueue {
    dotenvy::dotenv().ok();
    let mut config = QueueConfig::from_env();
    config.stream_name = format!("vidforge:test:jobs:{}", suffix);
    config.consumer_group = format!("vidforge:test:workers:{}", suffix);
    config.dlq_stream_name = format!("vidforge:test:dlq:{}", suffix);
    JobQueue::new(config).expect("Failed to create queue")
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_enqueue_claim_complete_lifecycle() {
    let queue = test_queue("lifecycle");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Kling, "a cat", "u1")
        .with_source_media("http://img/1.png");
    let job_id = job.job_id.clone();

    queue.enqueue(&job).await.expect("enqueue");

    let status = queue.get_status(&job_id).await.expect("status").unwrap();
    assert_eq!(status.state, JobState::Queued);

    let claimed = queue.claim("test-worker", 1000, 1).await.expect("claim");
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].job.job_id, job_id);
    assert_eq!(claimed[0].attempt, 1);

    let status = queue.get_status(&job_id).await.expect("status").unwrap();
    assert_eq!(status.state, JobState::Active);

    queue
        .complete(
            &claimed[0].message_id,
            &claimed[0].job,
            &MediaId::from_string("m-1"),
            "https://cdn/m-1.mp4",
        )
        .await
        .expect("complete");

    let status = queue.get_status(&job_id).await.expect("status").unwrap();
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.result_media_id, Some(MediaId::from_string("m-1")));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_claim_mutual_exclusion() {
    let queue = test_queue("mutex");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Runway, "two workers race", "u1");
    queue.enqueue(&job).await.expect("enqueue");

    let a = queue.claim("worker-a", 500, 10).await.expect("claim a");
    let b = queue.claim("worker-b", 500, 10).await.expect("claim b");

    // Exactly one consumer received the message.
    assert_eq!(a.len() + b.len(), 1);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_duplicate_enqueue_rejected() {
    let queue = test_queue("dedup");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Luma, "dup me", "u1");
    queue.enqueue(&job).await.expect("first enqueue");
    assert!(queue.enqueue(&job).await.is_err());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_retry_budget_leads_to_dlq() {
    let queue = test_queue("retries");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Runway, "always fails", "u1");
    let job_id = job.job_id.clone();
    queue.enqueue(&job).await.expect("enqueue");

    let claimed = queue.claim("test-worker", 1000, 1).await.expect("claim");
    let (message_id, job) = (claimed[0].message_id.clone(), claimed[0].job.clone());

    // Budget of 3: two retries, then dead-letter.
    assert_eq!(
        queue.fail(&message_id, &job).await.expect("fail 1"),
        FailureDisposition::Retry { attempt: 1 }
    );
    assert_eq!(
        queue.fail(&message_id, &job).await.expect("fail 2"),
        FailureDisposition::Retry { attempt: 2 }
    );
    assert_eq!(
        queue.fail(&message_id, &job).await.expect("fail 3"),
        FailureDisposition::DeadLetter { attempts: 3 }
    );

    queue
        .dead_letter(&message_id, &job, "provider exploded")
        .await
        .expect("dead_letter");

    let status = queue.get_status(&job_id).await.expect("status").unwrap();
    assert_eq!(status.state, JobState::Failed);
    assert_eq!(status.error_message.as_deref(), Some("provider exploded"));

    let dlq_len = queue.dlq_len().await.expect("dlq_len");
    assert!(dlq_len > 0);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_stalled_claim_recovery() {
    let queue = test_queue("stalled");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Pika, "crashy", "u1")
        .with_source_media("http://img/2.png");
    queue.enqueue(&job).await.expect("enqueue");

    // First worker claims but never resolves (simulated crash).
    let claimed = queue.claim("dead-worker", 1000, 1).await.expect("claim");
    assert_eq!(claimed.len(), 1);

    // A second worker reclaims after the lease (zero for the test).
    let reclaimed = queue
        .claim_stalled("live-worker", Duration::from_millis(0), 5)
        .await
        .expect("claim_stalled");
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].job.job_id, job.job_id);
    assert_eq!(reclaimed[0].attempt, 2);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_crash_loop_delivery_count_exceeds_budget() {
    let queue = test_queue("poison");
    queue.init().await.expect("init");

    let job = GenerateVideoJob::new(ProviderKind::Pika, "poison", "u1")
        .with_source_media("http://img/3.png");
    queue.enqueue(&job).await.expect("enqueue");

    queue.claim("worker-1", 1000, 1).await.expect("claim");

    // Three reclaims without ack or fail, as if the worker crashed
    // mid-job each time. Each XCLAIM bumps the delivery count.
    for n in 2..=4u32 {
        let reclaimed = queue
            .claim_stalled(&format!("worker-{}", n), Duration::from_millis(0), 5)
            .await
            .expect("claim_stalled");
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].attempt, n);
    }

    // The fourth delivery is over the budget of 3; the executor
    // dead-letters it instead of running it again.
    let queue_max = queue.max_attempts();
    assert!(4 > queue_max);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_unknown_job_status_is_none() {
    let queue = test_queue("unknown");
    queue.init().await.expect("init");

    let status = queue
        .get_status(&vidforge_models::JobId::from_string("job-nonexistent"))
        .await
        .expect("status");
    assert!(status.is_none());
}
