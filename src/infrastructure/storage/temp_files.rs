use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncReadExt;

use crate::application::ports::{ClipStorage, ClipStorageError};
use crate::domain::{AudioFormat, FileHandleId, UserId};

/// Prefix shared by every staged clip, so sweeps never touch foreign files
/// in the temp directory.
const STAGED_FILE_PREFIX: &str = "audio_";

/// Filesystem-backed clip staging under one shared directory.
pub struct TempFileStore {
    base_dir: PathBuf,
}

impl TempFileStore {
    pub fn new(base_dir: PathBuf) -> Result<Self, ClipStorageError> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn is_staged_file(entry_name: &str) -> bool {
        entry_name.starts_with(STAGED_FILE_PREFIX)
    }
}

#[async_trait]
impl ClipStorage for TempFileStore {
    fn allocate_path(
        &self,
        user_id: UserId,
        file_id: &FileHandleId,
        format: AudioFormat,
    ) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f");
        let name = format!(
            "{}{}_{}_{}.{}",
            STAGED_FILE_PREFIX,
            user_id,
            timestamp,
            file_id.fragment(),
            format.extension()
        );
        self.base_dir.join(name)
    }

    async fn on_disk_size(&self, path: &Path) -> Result<u64, ClipStorageError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ClipStorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(ClipStorageError::Io(e)),
        }
    }

    async fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ClipStorageError> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipStorageError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ClipStorageError::Io(e)),
        };

        let mut header = vec![0u8; len];
        let mut read = 0;
        while read < len {
            let n = file.read(&mut header[read..]).await?;
            if n == 0 {
                break;
            }
            read += n;
        }
        header.truncate(read);
        Ok(header)
    }

    async fn remove_file(&self, path: &Path) -> Result<(), ClipStorageError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            // Already gone is success for cleanup purposes.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClipStorageError::Io(e)),
        }
    }

    async fn stale_files(&self, older_than: Duration) -> Result<Vec<PathBuf>, ClipStorageError> {
        let cutoff = SystemTime::now()
            .checked_sub(older_than)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut stale = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !Self::is_staged_file(name) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if modified < cutoff {
                stale.push(entry.path());
            }
        }
        Ok(stale)
    }

    async fn staged_file_count(&self) -> Result<usize, ClipStorageError> {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if Self::is_staged_file(name) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    #[cfg(unix)]
    fn available_space(&self) -> Option<u64> {
        let c_path =
            std::ffi::CString::new(self.base_dir.to_string_lossy().as_bytes()).ok()?;
        // SAFETY: statvfs writes into the zeroed struct we hand it and the
        // path pointer lives for the duration of the call.
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) == 0 {
                Some(stat.f_bavail as u64 * stat.f_frsize as u64)
            } else {
                None
            }
        }
    }

    #[cfg(not(unix))]
    fn available_space(&self) -> Option<u64> {
        None
    }
}
