use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("Username must be between 3 and 24 characters")]
    Length,

    #[error("Username may only contain letters, digits and underscores")]
    Characters,
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern is valid"))
}

/// Checks a requested username. Input is expected to be trimmed already.
pub fn validate_username(username: &str) -> Result<(), UsernameError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(UsernameError::Length);
    }
    if !username_pattern().is_match(username) {
        return Err(UsernameError::Characters);
    }
    Ok(())
}
