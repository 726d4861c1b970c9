use std::fmt;

/// Audio container formats accepted from the messaging platform.
///
/// The two video variants cover the platform substituting `video/mp4` or
/// `video/webm` for voice and video notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Mp4,
    Wav,
    Webm,
    Ogg,
}

impl AudioFormat {
    pub const SUPPORTED_MIME_TYPES: &'static [&'static str] = &[
        "audio/mpeg",
        "audio/mp3",
        "audio/mp4",
        "audio/m4a",
        "audio/wav",
        "audio/wave",
        "audio/webm",
        "audio/ogg",
        "audio/opus",
        "video/mp4",
        "video/webm",
    ];

    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.to_ascii_lowercase().as_str() {
            "audio/mpeg" | "audio/mp3" => Some(AudioFormat::Mp3),
            "audio/mp4" | "audio/m4a" => Some(AudioFormat::M4a),
            "video/mp4" => Some(AudioFormat::Mp4),
            "audio/wav" | "audio/wave" => Some(AudioFormat::Wav),
            "audio/webm" | "video/webm" => Some(AudioFormat::Webm),
            "audio/ogg" | "audio/opus" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" | "mpeg" | "mpga" => Some(AudioFormat::Mp3),
            "m4a" => Some(AudioFormat::M4a),
            "mp4" => Some(AudioFormat::Mp4),
            "wav" | "wave" => Some(AudioFormat::Wav),
            "webm" => Some(AudioFormat::Webm),
            "ogg" | "oga" | "opus" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// File extension used when staging a clip on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Nominal bitrate in kbit/s, used only to estimate a clip's duration
    /// from its byte size for reporting.
    pub fn nominal_bitrate_kbps(&self) -> u32 {
        match self {
            AudioFormat::Mp3 | AudioFormat::M4a | AudioFormat::Mp4 => 128,
            AudioFormat::Wav => 1411,
            AudioFormat::Webm => 96,
            AudioFormat::Ogg => 64,
        }
    }

    /// Check the leading bytes of a file against this format's magic numbers.
    ///
    /// Catches extension/content mismatches before any bytes are sent to the
    /// speech service. An undersized header never matches.
    pub fn matches_signature(&self, header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }
        match self {
            AudioFormat::Mp3 => {
                if header.starts_with(b"ID3") {
                    // ID3v2: sane major version and revision bytes
                    header.len() >= 5 && header[3] <= 4 && header[4] <= 9
                } else {
                    // MPEG frame sync
                    header[..2] == [0xFF, 0xFB] || header[..2] == [0xFF, 0xFA]
                }
            }
            AudioFormat::M4a | AudioFormat::Mp4 => {
                // 'ftyp' atom within the first 12 bytes
                header.len() >= 8
                    && header
                        .windows(4)
                        .take(9)
                        .any(|w| w == b"ftyp")
            }
            AudioFormat::Wav => {
                header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WAVE"
            }
            AudioFormat::Webm => header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
            AudioFormat::Ogg => header.starts_with(b"OggS"),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
