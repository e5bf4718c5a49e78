//! On-Disk Audio Storage
//!
//! Each session keeps one synthesized reply, `audio_<session_id>.mp3`, which
//! is overwritten by the next turn. Session ids are validated before they are
//! used in a path.

use std::path::{Path, PathBuf};

/// Upper bound on session id length accepted for file names.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum AudioStoreError {
    #[error("session id '{0}' may only contain letters, digits, '-' and '_'")]
    InvalidSessionId(String),
    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks that `session_id` is safe to embed in a file name.
pub fn validate_session_id(session_id: &str) -> Result<(), AudioStoreError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AudioStoreError::InvalidSessionId(session_id.to_string()))
    }
}

/// Stores the most recent audio reply per session in a directory.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the audio file for `session_id`.
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf, AudioStoreError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("audio_{}.mp3", session_id)))
    }

    /// Writes `audio` for `session_id`, replacing any previous reply.
    pub async fn save(&self, session_id: &str, audio: &[u8]) -> Result<PathBuf, AudioStoreError> {
        let path = self.path_for(session_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, audio).await?;
        Ok(path)
    }

    /// Reads the stored audio for `session_id`, or `None` if none exists yet.
    pub async fn load(&self, session_id: &str) -> Result<Option<Vec<u8>>, AudioStoreError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
