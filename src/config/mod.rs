mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AudioSettings, ConfirmationSettings, JanitorSettings, LoggingSettings, Settings,
    SpeechSettings, TelegramSettings,
};
