use std::str::FromStr;

use super::TranscriptionId;

/// Action the user picked on a confirmation prompt.
///
/// Encoded as opaque tokens (`confirm_yes_<id>` / `confirm_no_<id>`) that
/// the chat surface routes back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationAction {
    Confirm,
    Reject,
}

impl ConfirmationAction {
    const YES_PREFIX: &'static str = "confirm_yes_";
    const NO_PREFIX: &'static str = "confirm_no_";

    pub fn token(&self, id: TranscriptionId) -> String {
        match self {
            ConfirmationAction::Confirm => format!("{}{}", Self::YES_PREFIX, id),
            ConfirmationAction::Reject => format!("{}{}", Self::NO_PREFIX, id),
        }
    }

    /// Parse a routed-back token into the action and the transcription it
    /// targets. Returns `None` for anything that is not a confirmation token.
    pub fn parse(token: &str) -> Option<(Self, TranscriptionId)> {
        if let Some(raw) = token.strip_prefix(Self::YES_PREFIX) {
            let id = TranscriptionId::from_str(raw).ok()?;
            Some((ConfirmationAction::Confirm, id))
        } else if let Some(raw) = token.strip_prefix(Self::NO_PREFIX) {
            let id = TranscriptionId::from_str(raw).ok()?;
            Some((ConfirmationAction::Reject, id))
        } else {
            None
        }
    }
}
