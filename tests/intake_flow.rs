mod helpers;

use std::sync::Arc;
use std::time::Duration;

use contavoz::application::ports::{ClipStorage, SpeechError};
use contavoz::application::services::{
    AudioDownloader, AudioQueueManager, AudioValidator, ConfirmError, IntakeError,
    PendingConfirmationStore, SlidingWindowLimiter, StatusBoard, TempFileJanitor, Transcriber,
    VoiceIntakeService,
};
use contavoz::domain::{FileHandleId, ProcessingStatus, UserId};

use helpers::{
    descriptor, ogg_bytes, FixtureStorage, MockGateway, MockNotifier, MockPrompt, MockRecorder,
    MockSpeech,
};

struct Harness {
    service: Arc<VoiceIntakeService>,
    storage: Arc<FixtureStorage>,
    prompt: Arc<MockPrompt>,
    recorder: Arc<MockRecorder>,
    statuses: Arc<StatusBoard>,
}

fn build(
    gateway: Arc<MockGateway>,
    speech: Arc<MockSpeech>,
    prompt: Arc<MockPrompt>,
    recorder: Arc<MockRecorder>,
    ttl: chrono::Duration,
) -> Harness {
    let storage = FixtureStorage::new();
    let statuses = Arc::new(StatusBoard::new());
    let confirmations = Arc::new(PendingConfirmationStore::with_ttl(ttl));
    let janitor = Arc::new(TempFileJanitor::new(storage.clone()));

    let service = Arc::new(VoiceIntakeService::new(
        AudioValidator::new(storage.clone()),
        SlidingWindowLimiter::new(),
        AudioQueueManager::new(Arc::clone(&statuses)),
        Arc::clone(&statuses),
        AudioDownloader::new(gateway, storage.clone(), Arc::clone(&statuses)),
        Transcriber::new(speech, storage.clone(), Arc::clone(&statuses), "pt"),
        confirmations,
        janitor,
        storage.clone(),
        prompt.clone(),
        recorder.clone(),
    ));

    Harness {
        service,
        storage,
        prompt,
        recorder,
        statuses,
    }
}

fn default_harness(speech: Arc<MockSpeech>) -> Harness {
    build(
        MockGateway::writing(ogg_bytes(2 * 1024 * 1024)),
        speech,
        MockPrompt::new(),
        MockRecorder::new(),
        chrono::Duration::minutes(5),
    )
}

#[tokio::test]
async fn given_valid_clip_when_processed_then_confirmation_prompt_carries_transcript() {
    let harness = default_harness(MockSpeech::succeeding("gastei vinte reais no mercado"));
    let user = UserId::new(1);
    let clip = descriptor(1, "clip-e2e", 2 * 1024 * 1024, 30, "audio/ogg");

    let position = harness.service.submit(clip).unwrap();
    assert_eq!(position, 0);

    harness.service.drain_user(user).await;

    let request = harness.prompt.last().expect("prompt delivered");
    assert_eq!(request.transcribed_text, "gastei vinte reais no mercado");
    assert_eq!(request.user_id, user);
    assert!(request.confirm_token.starts_with("confirm_yes_"));
    assert!(request.reject_token.starts_with("confirm_no_"));
    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-e2e")),
        Some(ProcessingStatus::AwaitingConfirmation)
    );
    // Clip bytes never outlive the processing window.
    assert_eq!(harness.storage.staged_file_count().await.unwrap(), 0);
}

#[tokio::test]
async fn given_confirmed_transcript_when_resolving_yes_token_then_expense_recorded() {
    let harness = default_harness(MockSpeech::succeeding("gastei vinte reais"));
    let user = UserId::new(1);
    harness
        .service
        .submit(descriptor(1, "clip-yes", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(user).await;
    let request = harness.prompt.last().unwrap();

    let outcome = harness
        .service
        .resolve_action(&request.confirm_token)
        .await
        .expect("token recognized");
    assert!(outcome.is_ok());

    let recorded = harness.recorder.recorded.lock().unwrap().clone();
    assert_eq!(recorded, vec![(user, "gastei vinte reais".to_string())]);
    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-yes")),
        Some(ProcessingStatus::Completed)
    );
}

#[tokio::test]
async fn given_rejected_transcript_when_resolving_no_token_then_nothing_recorded() {
    let harness = default_harness(MockSpeech::succeeding("texto indesejado"));
    harness
        .service
        .submit(descriptor(1, "clip-no", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;
    let request = harness.prompt.last().unwrap();

    let outcome = harness
        .service
        .resolve_action(&request.reject_token)
        .await
        .expect("token recognized");
    assert!(outcome.is_ok());

    assert!(harness.recorder.recorded.lock().unwrap().is_empty());
    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-no")),
        Some(ProcessingStatus::Rejected)
    );

    // Answering the same prompt twice is a harmless no-op.
    assert!(harness
        .service
        .resolve_action(&request.reject_token)
        .await
        .unwrap()
        .is_ok());
}

#[tokio::test]
async fn given_confirm_after_already_handled_then_not_found() {
    let harness = default_harness(MockSpeech::succeeding("gastei dez reais"));
    harness
        .service
        .submit(descriptor(1, "clip-twice", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;
    let request = harness.prompt.last().unwrap();

    harness
        .service
        .resolve_action(&request.confirm_token)
        .await
        .unwrap()
        .unwrap();

    let second = harness
        .service
        .resolve_action(&request.confirm_token)
        .await
        .unwrap();
    assert!(matches!(second, Err(ConfirmError::NotFoundOrExpired)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_duplicated_confirm_callbacks_when_racing_then_exactly_one_expense_recorded() {
    // Chat platforms redeliver callback queries; the claim on the pending
    // entry must let only one of them through to the recorder.
    let harness = default_harness(MockSpeech::succeeding("gastei vinte reais"));
    harness
        .service
        .submit(descriptor(1, "clip-dup", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;
    let token = harness.prompt.last().unwrap().confirm_token;

    let spawn_confirm = |service: Arc<VoiceIntakeService>, token: String| {
        tokio::spawn(async move { service.resolve_action(&token).await.unwrap() })
    };
    let first = spawn_confirm(Arc::clone(&harness.service), token.clone());
    let second = spawn_confirm(Arc::clone(&harness.service), token);

    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, Err(ConfirmError::NotFoundOrExpired))));
    assert_eq!(harness.recorder.recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn given_foreign_token_when_resolving_then_ignored() {
    let harness = default_harness(MockSpeech::succeeding("unused"));
    assert!(harness.service.resolve_action("category_food").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn given_user_over_rate_limit_when_submitting_then_rejected() {
    let harness = default_harness(MockSpeech::succeeding("unused"));

    for i in 0..5 {
        harness
            .service
            .submit(descriptor(1, &format!("clip-{i}"), 1024 * 1024, 30, "audio/ogg"))
            .unwrap();
    }

    let err = harness
        .service
        .submit(descriptor(1, "clip-6", 1024 * 1024, 30, "audio/ogg"))
        .unwrap_err();
    assert!(matches!(err, IntakeError::RateLimited));

    // Another user is not affected by the first user's window.
    assert!(harness
        .service
        .submit(descriptor(2, "clip-other", 1024 * 1024, 30, "audio/ogg"))
        .is_ok());
}

#[tokio::test]
async fn given_invalid_clip_when_submitting_then_validation_error_and_nothing_queued() {
    let harness = default_harness(MockSpeech::succeeding("unused"));

    let err = harness
        .service
        .submit(descriptor(1, "clip-huge", 30 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));

    let stats = harness.service.stats().await;
    assert_eq!(stats.queued_clips, 0);
}

#[tokio::test]
async fn given_transcription_failure_when_draining_then_clip_failed_and_file_removed() {
    let harness = build(
        MockGateway::writing(ogg_bytes(1024 * 1024)),
        MockSpeech::scripted(vec![Err(SpeechError::Auth("revoked".into()))]),
        MockPrompt::new(),
        MockRecorder::new(),
        chrono::Duration::minutes(5),
    );
    harness
        .service
        .submit(descriptor(1, "clip-fail", 1024 * 1024, 30, "audio/ogg"))
        .unwrap();

    harness.service.drain_user(UserId::new(1)).await;

    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-fail")),
        Some(ProcessingStatus::Failed)
    );
    assert!(harness.prompt.last().is_none());
    assert_eq!(harness.storage.staged_file_count().await.unwrap(), 0);
}

#[tokio::test]
async fn given_prompt_delivery_failure_when_draining_then_pending_entry_discarded() {
    let harness = build(
        MockGateway::writing(ogg_bytes(1024 * 1024)),
        MockSpeech::succeeding("gastei cinco reais"),
        MockPrompt::failing(),
        MockRecorder::new(),
        chrono::Duration::minutes(5),
    );
    harness
        .service
        .submit(descriptor(1, "clip-undelivered", 1024 * 1024, 30, "audio/ogg"))
        .unwrap();

    harness.service.drain_user(UserId::new(1)).await;

    let stats = harness.service.stats().await;
    assert_eq!(stats.pending_confirmations, 0);
    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-undelivered")),
        Some(ProcessingStatus::Failed)
    );
}

#[tokio::test]
async fn given_recorder_failure_when_confirming_then_error_and_clip_failed() {
    let harness = build(
        MockGateway::writing(ogg_bytes(1024 * 1024)),
        MockSpeech::succeeding("gastei cem reais"),
        MockPrompt::new(),
        MockRecorder::failing(),
        chrono::Duration::minutes(5),
    );
    harness
        .service
        .submit(descriptor(1, "clip-rec", 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;
    let request = harness.prompt.last().unwrap();

    let outcome = harness
        .service
        .resolve_action(&request.confirm_token)
        .await
        .unwrap();
    assert!(matches!(outcome, Err(ConfirmError::Recorder(_))));
    assert_eq!(
        harness.statuses.get(&FileHandleId::new("clip-rec")),
        Some(ProcessingStatus::Failed)
    );
}

#[tokio::test]
async fn given_unconfirmed_transcript_when_ttl_elapses_then_sweeper_notifies_and_discards() {
    let harness = build(
        MockGateway::writing(ogg_bytes(1024 * 1024)),
        MockSpeech::succeeding("gastei trinta reais"),
        MockPrompt::new(),
        MockRecorder::new(),
        chrono::Duration::milliseconds(40),
    );
    let notifier = MockNotifier::new();
    harness.service.start_background_tasks(
        notifier.clone(),
        Duration::from_millis(50),
        Duration::from_secs(3600),
    );

    harness
        .service
        .submit(descriptor(1, "clip-expire", 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;
    let request = harness.prompt.last().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(notifier.count(), 1);
    let late = harness
        .service
        .resolve_action(&request.confirm_token)
        .await
        .unwrap();
    assert!(matches!(late, Err(ConfirmError::NotFoundOrExpired)));
    assert!(harness.recorder.recorded.lock().unwrap().is_empty());
    // Expiry clears the clip's status entry entirely.
    assert_eq!(harness.statuses.get(&FileHandleId::new("clip-expire")), None);

    harness.service.shutdown().await;
}

#[tokio::test]
async fn given_active_pipeline_when_asking_stats_then_snapshot_reflects_state() {
    let harness = default_harness(MockSpeech::succeeding("gastei quinze reais"));
    harness
        .service
        .submit(descriptor(1, "clip-stats", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();

    let before = harness.service.stats().await;
    assert_eq!(before.queued_clips, 1);
    assert_eq!(before.active_users, 1);
    assert_eq!(before.pending_confirmations, 0);

    harness.service.drain_user(UserId::new(1)).await;

    let after = harness.service.stats().await;
    assert_eq!(after.queued_clips, 0);
    assert_eq!(after.pending_confirmations, 1);
    assert_eq!(
        after
            .status_counts
            .get(&ProcessingStatus::AwaitingConfirmation),
        Some(&1)
    );
}

#[tokio::test]
async fn given_running_service_when_shutting_down_then_all_state_discarded() {
    let harness = default_harness(MockSpeech::succeeding("gastei oito reais"));
    let notifier = MockNotifier::new();
    harness.service.start_background_tasks(
        notifier,
        Duration::from_secs(60),
        Duration::from_secs(3600),
    );
    harness
        .service
        .submit(descriptor(1, "clip-shutdown", 2 * 1024 * 1024, 30, "audio/ogg"))
        .unwrap();
    harness.service.drain_user(UserId::new(1)).await;

    harness.service.shutdown().await;

    let stats = harness.service.stats().await;
    assert_eq!(stats.queued_clips, 0);
    assert_eq!(stats.pending_confirmations, 0);
    assert!(stats.status_counts.is_empty());
}
