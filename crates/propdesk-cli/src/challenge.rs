//! Pending OTP challenge kept between `login` and `verify` invocations

use anyhow::{Context, Result};
use propdesk_client::write_private_file;
use propdesk_core::OtpChallenge;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

const FILE_NAME: &str = "otp_challenge.json";

/// JSON file holding at most one pending challenge
#[derive(Debug, Clone)]
pub struct ChallengeFile {
    path: PathBuf,
}

impl ChallengeFile {
    /// Challenge file stored next to `session_path`
    pub fn beside(session_path: &Path) -> Self {
        Self {
            path: session_path.with_file_name(FILE_NAME),
        }
    }

    /// Pending challenge, if any
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<OtpChallenge>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        let challenge = serde_json::from_str(&contents)
            .with_context(|| format!("corrupt challenge file {}", self.path.display()))?;
        Ok(Some(challenge))
    }

    /// Replace the pending challenge
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, challenge: &OtpChallenge) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        write_private_file(&self.path, &serde_json::to_vec_pretty(challenge)?)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Forget the pending challenge
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}
