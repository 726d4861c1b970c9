use std::fmt;

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(i64);

impl ChatId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformMessageId(i64);

impl PlatformMessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlatformMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle the messaging platform assigns to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandleId(String);

impl FileHandleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short fragment used when building unique temp file names.
    pub fn fragment(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for FileHandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One incoming audio clip as declared by the messaging platform.
///
/// Immutable once created; produced at the message-ingestion boundary
/// before any bytes are downloaded.
#[derive(Debug, Clone)]
pub struct AudioDescriptor {
    pub file_id: FileHandleId,
    pub file_size: u64,
    pub duration_secs: u32,
    pub mime_type: String,
    pub user_id: UserId,
    pub message_id: PlatformMessageId,
    pub chat_id: ChatId,
}
