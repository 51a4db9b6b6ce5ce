use crate::error::ConfigError;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads a newline-delimited list, trimming each line and skipping blanks.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        msg: e.to_string(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Ordered list of raw account tokens, one per line of the token file.
///
/// Account numbering is 1-based and follows line order, which is also how
/// proxies are matched to accounts.
pub struct TokenManager {
    tokens: Vec<String>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("count", &self.tokens.len())
            .field("tokens", &"***REDACTED***")
            .finish()
    }
}

impl TokenManager {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let tokens = read_lines(path)?;
        if tokens.is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("tokens in {}", path.display()),
            });
        }

        info!("Loaded {} account tokens from {}", tokens.len(), path.display());
        Ok(Self { tokens })
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Returns the number of configured accounts
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get_token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}
