use crate::{PostsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Private,
    Trash,
}

impl PostStatus {
    /// Every supported status, in declaration order
    pub const ALL: &'static [PostStatus] = &[
        PostStatus::Draft,
        PostStatus::Published,
        PostStatus::Private,
        PostStatus::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Private => "private",
            PostStatus::Trash => "trash",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = PostsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "private" => Ok(PostStatus::Private),
            "trash" => Ok(PostStatus::Trash),
            other => Err(PostsError::UnknownStatus(other.to_string())),
        }
    }
}
