//! Blog post storage trait and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod sqlite;

pub use sqlite::SqliteBlogStore;

/// Error type for blog post storage.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// A generated article owned by one user. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub owner: String,
    pub youtube_title: String,
    pub youtube_link: String,
    pub generated_content: String,
    pub created_at: DateTime<Utc>,
}

/// Request to store a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlogPost {
    pub owner: String,
    pub youtube_title: String,
    pub youtube_link: String,
    pub generated_content: String,
}

/// Append-only storage of blog posts.
#[cfg_attr(test, mockall::automock)]
pub trait BlogStore: Send + Sync {
    /// Insert a post in a single write and return it with its id.
    fn create(&self, post: NewBlogPost) -> Result<BlogPost, StoreError>;

    /// Get a post by id regardless of owner.
    fn get(&self, id: i64) -> Result<Option<BlogPost>, StoreError>;

    /// Posts of one owner, newest first.
    fn list_by_owner(&self, owner: &str) -> Result<Vec<BlogPost>, StoreError>;
}
