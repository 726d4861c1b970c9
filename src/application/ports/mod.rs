mod clip_storage;
mod confirmation_prompt;
mod expense_recorder;
mod expiry_notifier;
mod media_gateway;
mod speech_to_text;

pub use clip_storage::{ClipStorage, ClipStorageError};
pub use confirmation_prompt::{ConfirmationPrompt, ConfirmationRequest, PromptError};
pub use expense_recorder::{ExpenseRecorder, ExpenseRecorderError};
pub use expiry_notifier::ExpiryNotifier;
pub use media_gateway::{MediaGateway, MediaGatewayError};
pub use speech_to_text::{SpeechError, SpeechRequest, SpeechResponse, SpeechToText};
