use serde::Serialize;
use std::fmt::Display;

use crate::error::{AppError, AppResult};

const MAX_USERNAME_LEN: usize = 64;

/// Identifier a dataset is stored under.
///
/// Restricted to `[A-Za-z0-9_.-]` without a leading dot so it can double as a file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let name = raw.trim();

        if name.is_empty() {
            return Err(AppError::InvalidInput("Username is required".to_string()));
        }
        if name.len() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if name.starts_with('.')
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(AppError::InvalidInput(format!("Invalid username: {}", name)));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
