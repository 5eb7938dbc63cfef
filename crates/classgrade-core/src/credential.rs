//! Access-token credential loaded once at startup.

use std::fmt;
use std::path::Path;

use crate::error::{GraderError, Result};

/// Default credential file name, resolved relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = "token";

/// An access token for the repository host.
///
/// The token is never printed: `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
        }
    }

    /// Read the token file, trimming surrounding whitespace. A missing or
    /// blank file is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| GraderError::Credential {
            path: path.to_path_buf(),
            source,
        })?;
        let credential = Self::new(data);
        if credential.token.is_empty() {
            return Err(GraderError::EmptyCredential(path.to_path_buf()));
        }
        Ok(credential)
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}
