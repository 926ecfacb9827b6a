//! SQLite-backed blog post store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{BlogPost, BlogStore, NewBlogPost, StoreError};

const SELECT_COLUMNS: &str =
    "SELECT id, owner, youtube_title, youtube_link, generated_content, created_at FROM blog_posts";

/// SQLite-backed blog post store.
pub struct SqliteBlogStore {
    conn: Mutex<Connection>,
}

impl SqliteBlogStore {
    /// Open the database file, creating it and the table if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                youtube_title TEXT NOT NULL,
                youtube_link TEXT NOT NULL,
                generated_content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_blog_posts_owner ON blog_posts(owner);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<BlogPost> {
        let created_at_str: String = row.get(5)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(BlogPost {
            id: row.get(0)?,
            owner: row.get(1)?,
            youtube_title: row.get(2)?,
            youtube_link: row.get(3)?,
            generated_content: row.get(4)?,
            created_at,
        })
    }
}

impl BlogStore for SqliteBlogStore {
    fn create(&self, post: NewBlogPost) -> Result<BlogPost, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO blog_posts (owner, youtube_title, youtube_link, generated_content, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                post.owner,
                post.youtube_title,
                post.youtube_link,
                post.generated_content,
                now.to_rfc3339(),
            ],
        )?;

        Ok(BlogPost {
            id: conn.last_insert_rowid(),
            owner: post.owner,
            youtube_title: post.youtube_title,
            youtube_link: post.youtube_link,
            generated_content: post.generated_content,
            created_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<BlogPost>, StoreError> {
        let conn = self.lock()?;

        let post = conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_post,
            )
            .optional()?;

        Ok(post)
    }

    fn list_by_owner(&self, owner: &str) -> Result<Vec<BlogPost>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE owner = ? ORDER BY id DESC",
            SELECT_COLUMNS
        ))?;
        let posts = stmt
            .query_map(params![owner], Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(owner: &str, title: &str) -> NewBlogPost {
        NewBlogPost {
            owner: owner.to_string(),
            youtube_title: title.to_string(),
            youtube_link: "https://youtu.be/abc123".to_string(),
            generated_content: format!("# {}\n...", title),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SqliteBlogStore::in_memory().unwrap();

        let created = store.create(new_post("alice", "First")).unwrap();
        let fetched = store.get(created.id).unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.owner, "alice");
        assert_eq!(fetched.youtube_title, "First");
        assert_eq!(fetched.generated_content, "# First\n...");
        assert_eq!(fetched.created_at.timestamp(), created.created_at.timestamp());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqliteBlogStore::in_memory().unwrap();
        assert_eq!(store.get(42).unwrap(), None);
    }

    #[test]
    fn test_list_is_scoped_to_owner_newest_first() {
        let store = SqliteBlogStore::in_memory().unwrap();
        store.create(new_post("alice", "One")).unwrap();
        store.create(new_post("bob", "Other")).unwrap();
        store.create(new_post("alice", "Two")).unwrap();

        let titles: Vec<String> = store
            .list_by_owner("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.youtube_title)
            .collect();

        assert_eq!(titles, vec!["Two", "One"]);
        assert!(store.list_by_owner("carol").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("blog.db");

        let id = {
            let store = SqliteBlogStore::new(&db_path).unwrap();
            store.create(new_post("alice", "Kept")).unwrap().id
        };

        let store = SqliteBlogStore::new(&db_path).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().youtube_title, "Kept");
    }
}
