use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Shown when the author's profile cannot be resolved to a display name.
pub const FALLBACK_AUTHOR_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscussionIdError {
    #[error("discussion id is empty")]
    Empty,
    #[error("discussion id is too long (max 64 chars)")]
    TooLong,
    #[error("discussion id contains invalid characters (allowed: a-z, 0-9, '-', '.', '_')")]
    InvalidChars,
}

/// Identifier of the review or forum post a comment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscussionId(String);

impl DiscussionId {
    pub fn new(s: impl Into<String>) -> Result<Self, DiscussionIdError> {
        let s = s.into();
        if s.is_empty() {
            return Err(DiscussionIdError::Empty);
        }
        if s.len() > 64 {
            return Err(DiscussionIdError::TooLong);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
        {
            return Err(DiscussionIdError::InvalidChars);
        }
        Ok(Self(s))
    }

    /// For ids read back from storage, which were validated on the way in.
    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiscussionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionKind {
    #[default]
    Review,
    ForumPost,
}

impl DiscussionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionKind::Review => "review",
            DiscussionKind::ForumPost => "forum_post",
        }
    }
}

/// One comment row as handed over by the storage layer. The display name is
/// already resolved there (placeholder included); nothing downstream looks up
/// usernames again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub discussion_id: DiscussionId,
    pub author_id: String,
    pub author_display_name: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub parent_id: Option<String>,
}
