mod audio_descriptor;
mod audio_format;
mod confirmation_action;
mod pending_transcription;
mod processing_status;
mod transcript;

pub use audio_descriptor::{AudioDescriptor, ChatId, FileHandleId, PlatformMessageId, UserId};
pub use audio_format::AudioFormat;
pub use confirmation_action::ConfirmationAction;
pub use pending_transcription::{PendingTranscription, TranscriptionId};
pub use processing_status::ProcessingStatus;
pub use transcript::Transcript;
