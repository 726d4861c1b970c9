#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use contavoz::application::ports::{
    ClipStorage, ClipStorageError, ConfirmationPrompt, ConfirmationRequest, ExpenseRecorder,
    ExpenseRecorderError, ExpiryNotifier, MediaGateway, MediaGatewayError, PromptError,
    SpeechError, SpeechRequest, SpeechResponse, SpeechToText,
};
use contavoz::domain::{
    AudioDescriptor, AudioFormat, ChatId, FileHandleId, PendingTranscription, PlatformMessageId,
    UserId,
};
use contavoz::infrastructure::storage::TempFileStore;

pub fn descriptor(user: i64, file_id: &str, size: u64, duration: u32, mime: &str) -> AudioDescriptor {
    AudioDescriptor {
        file_id: FileHandleId::new(file_id),
        file_size: size,
        duration_secs: duration,
        mime_type: mime.to_string(),
        user_id: UserId::new(user),
        message_id: PlatformMessageId::new(100),
        chat_id: ChatId::new(user),
    }
}

/// Real temp-dir storage with an overridable free-space reading.
pub struct FixtureStorage {
    inner: TempFileStore,
    pub free_space: Option<u64>,
    _dir: tempfile::TempDir,
}

impl FixtureStorage {
    pub fn new() -> Arc<Self> {
        Self::with_free_space(None)
    }

    pub fn with_free_space(free_space: Option<u64>) -> Arc<Self> {
        let dir = tempfile::tempdir().expect("tempdir");
        let inner = TempFileStore::new(dir.path().to_path_buf()).expect("temp store");
        Arc::new(Self {
            inner,
            free_space,
            _dir: dir,
        })
    }

    pub fn base_dir(&self) -> &Path {
        self.inner.base_dir()
    }
}

#[async_trait]
impl ClipStorage for FixtureStorage {
    fn allocate_path(
        &self,
        user_id: UserId,
        file_id: &FileHandleId,
        format: AudioFormat,
    ) -> PathBuf {
        self.inner.allocate_path(user_id, file_id, format)
    }

    async fn on_disk_size(&self, path: &Path) -> Result<u64, ClipStorageError> {
        self.inner.on_disk_size(path).await
    }

    async fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ClipStorageError> {
        self.inner.read_prefix(path, len).await
    }

    async fn remove_file(&self, path: &Path) -> Result<(), ClipStorageError> {
        self.inner.remove_file(path).await
    }

    async fn stale_files(&self, older_than: Duration) -> Result<Vec<PathBuf>, ClipStorageError> {
        self.inner.stale_files(older_than).await
    }

    async fn staged_file_count(&self) -> Result<usize, ClipStorageError> {
        self.inner.staged_file_count().await
    }

    fn available_space(&self) -> Option<u64> {
        self.free_space
    }
}

/// What the mock gateway should do for one download.
pub enum GatewayBehavior {
    Write(Vec<u8>),
    Fail(String),
}

/// Scripted platform gateway; behaviors are consumed in order, the last
/// one repeating.
pub struct MockGateway {
    script: Mutex<VecDeque<GatewayBehavior>>,
}

impl MockGateway {
    pub fn writing(bytes: Vec<u8>) -> Arc<Self> {
        Self::scripted(vec![GatewayBehavior::Write(bytes)])
    }

    pub fn scripted(behaviors: Vec<GatewayBehavior>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(behaviors.into()),
        })
    }
}

#[async_trait]
impl MediaGateway for MockGateway {
    async fn download_to(
        &self,
        _file_id: &FileHandleId,
        destination: &Path,
    ) -> Result<(), MediaGatewayError> {
        let behavior = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().map(|b| match b {
                    GatewayBehavior::Write(bytes) => GatewayBehavior::Write(bytes.clone()),
                    GatewayBehavior::Fail(msg) => GatewayBehavior::Fail(msg.clone()),
                })
            }
        };
        match behavior {
            Some(GatewayBehavior::Write(bytes)) => {
                tokio::fs::write(destination, bytes).await?;
                Ok(())
            }
            Some(GatewayBehavior::Fail(msg)) => Err(MediaGatewayError::RequestFailed(msg)),
            None => Err(MediaGatewayError::NotFound("unscripted".to_string())),
        }
    }
}

/// Scripted speech service recording the instant of every call.
pub struct MockSpeech {
    script: Mutex<VecDeque<Result<SpeechResponse, SpeechError>>>,
    pub call_times: Mutex<Vec<Instant>>,
}

impl MockSpeech {
    pub fn scripted(results: Vec<Result<SpeechResponse, SpeechError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(results.into()),
            call_times: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(text: &str) -> Arc<Self> {
        Self::scripted(vec![Ok(SpeechResponse {
            text: text.to_string(),
            detected_language: None,
        })])
    }

    pub fn calls(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechToText for MockSpeech {
    async fn transcribe(&self, _request: &SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        self.call_times.lock().unwrap().push(Instant::now());
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            match script.front() {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(_)) | None => script
                    .pop_front()
                    .unwrap_or(Err(SpeechError::Network("unscripted".to_string()))),
            }
        }
    }
}

#[derive(Default)]
pub struct MockPrompt {
    pub requests: Mutex<Vec<ConfirmationRequest>>,
    pub fail: Mutex<bool>,
}

impl MockPrompt {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let prompt = Self::default();
        *prompt.fail.lock().unwrap() = true;
        Arc::new(prompt)
    }

    pub fn last(&self) -> Option<ConfirmationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ConfirmationPrompt for MockPrompt {
    async fn request_confirmation(&self, request: &ConfirmationRequest) -> Result<(), PromptError> {
        if *self.fail.lock().unwrap() {
            return Err(PromptError::DeliveryFailed("scripted failure".to_string()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockRecorder {
    pub recorded: Mutex<Vec<(UserId, String)>>,
    pub fail: Mutex<bool>,
}

impl MockRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let recorder = Self::default();
        *recorder.fail.lock().unwrap() = true;
        Arc::new(recorder)
    }
}

#[async_trait]
impl ExpenseRecorder for MockRecorder {
    async fn record_expense(
        &self,
        user_id: UserId,
        transcription: &PendingTranscription,
    ) -> Result<(), ExpenseRecorderError> {
        if *self.fail.lock().unwrap() {
            return Err(ExpenseRecorderError::PersistenceFailed(
                "scripted failure".to_string(),
            ));
        }
        self.recorded
            .lock()
            .unwrap()
            .push((user_id, transcription.transcribed_text.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub expired: Mutex<Vec<PendingTranscription>>,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.expired.lock().unwrap().len()
    }
}

#[async_trait]
impl ExpiryNotifier for MockNotifier {
    async fn notify_expired(&self, transcription: &PendingTranscription) {
        self.expired.lock().unwrap().push(transcription.clone());
    }
}

/// Minimal valid headers by format, padded to a requested size.
pub fn ogg_bytes(total_len: usize) -> Vec<u8> {
    let mut bytes = b"OggS".to_vec();
    bytes.resize(total_len, 0x1F);
    bytes
}

pub fn wav_bytes(total_len: usize) -> Vec<u8> {
    let mut bytes = b"RIFF\x24\x00\x00\x00WAVE".to_vec();
    bytes.resize(total_len.max(12), 0x00);
    bytes
}
