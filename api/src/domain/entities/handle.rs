//! Handle domain entity
//!
//! A public account identifier. Handles key both the cache and refresh work.

use serde::{Deserialize, Serialize};

const MAX_HANDLE_LEN: usize = 15;

/// Validated account handle (without the leading `@`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Handle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw = trimmed.strip_prefix('@').unwrap_or(trimmed);

        if raw.is_empty() {
            return Err("Handle must not be empty".to_string());
        }
        if raw.len() > MAX_HANDLE_LEN {
            return Err(format!(
                "Handle {:?} is longer than {} characters",
                raw, MAX_HANDLE_LEN
            ));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("Handle {:?} contains invalid characters", raw));
        }

        Ok(Self(raw.to_string()))
    }
}

impl TryFrom<String> for Handle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
