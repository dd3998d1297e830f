//! Database Connection Management
//!
//! Connection handling, schema creation and the raw SQL behind the node tree
//! store, using libsql as an embedded SQLite-compatible engine.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any file path; parent directories are created on demand
//! - **Idempotent schema**: `CREATE TABLE IF NOT EXISTS`, safe on every start
//! - **WAL mode**: Write-Ahead Logging for concurrent readers
//! - **Foreign keys**: Enabled per connection; pages cascade with their space and parent
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions.** It sets a
//! 5-second busy timeout so concurrent writers wait instead of failing with
//! `SQLITE_BUSY`, and switches on foreign-key enforcement for the connection.
//!
//! ```no_run
//! # use unfold_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/unfold.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Column list shared by every node query, in `row_to_node` order
pub(crate) const NODE_COLUMNS: &str =
    "id, space_id, parent_id, name, content, is_open, is_pinned, sort_order, created_at, updated_at";

pub(crate) const SPACE_COLUMNS: &str = "id, name, sort_order, created_at, updated_at";

pub(crate) const IMAGE_COLUMNS: &str =
    "id, note_id, filename, original_name, path, size, mime_type, created_at";

/// Database service for managing the libsql handle and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for node insertion
pub struct DbCreateNodeParams<'a> {
    pub id: &'a str,
    pub space_id: &'a str,
    pub parent_id: Option<&'a str>,
    pub name: &'a str,
    pub content: &'a str,
    pub is_open: bool,
    pub is_pinned: bool,
    pub sort_order: i64,
}

/// Parameters for a partial node update; `None` leaves the column untouched
#[derive(Default)]
pub struct DbUpdateNodeParams<'a> {
    pub name: Option<&'a str>,
    pub content: Option<&'a str>,
    pub is_open: Option<bool>,
    pub is_pinned: Option<bool>,
}

/// Parameters for image metadata insertion
pub struct DbCreateImageParams<'a> {
    pub id: &'a str,
    pub note_id: Option<&'a str>,
    pub filename: &'a str,
    pub original_name: &'a str,
    pub path: &'a str,
    pub size: i64,
    pub mime_type: Option<&'a str>,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created, the
    /// connection fails or the schema cannot be created.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;
        tracing::info!("Opened database at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes
    ///
    /// # Schema
    ///
    /// - `spaces`: top-level workspaces
    /// - `nodes`: pages, self-referential through `parent_id`
    /// - `images`: attachment metadata
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS spaces (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create spaces table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                space_id TEXT NOT NULL,
                parent_id TEXT,
                name TEXT NOT NULL DEFAULT '',
                content TEXT,
                is_open INTEGER NOT NULL DEFAULT 0,
                is_pinned INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES nodes(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create nodes table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS images (
                id TEXT PRIMARY KEY,
                note_id TEXT,
                filename TEXT NOT NULL,
                original_name TEXT NOT NULL,
                path TEXT NOT NULL,
                size INTEGER NOT NULL DEFAULT 0,
                mime_type TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create images table: {}", e))
        })?;

        for (name, sql) in [
            (
                "idx_nodes_space",
                "CREATE INDEX IF NOT EXISTS idx_nodes_space ON nodes(space_id)",
            ),
            (
                "idx_nodes_parent",
                "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
            ),
            (
                "idx_images_note",
                "CREATE INDEX IF NOT EXISTS idx_images_note ON images(note_id)",
            ),
        ] {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Get a synchronous connection handle
    ///
    /// Only for single-threaded code that never holds the connection across
    /// an await point. Prefer `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    //
    // SPACE OPERATIONS
    //

    /// All spaces in creation order
    pub async fn db_list_spaces(&self) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM spaces ORDER BY sort_order ASC, created_at ASC, rowid ASC",
                SPACE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare list_spaces query: {}", e))
            })?;

        stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute list_spaces query: {}", e))
        })
    }

    pub async fn db_get_space(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM spaces WHERE id = ?", SPACE_COLUMNS))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_space query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_space query: {}", e))
        })?;

        rows.next().await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to read get_space row: {}", e))
        })
    }

    pub async fn db_create_space(
        &self,
        id: &str,
        name: &str,
        sort_order: i64,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO spaces (id, name, sort_order) VALUES (?, ?, ?)",
            (id, name, sort_order),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert space: {}", e)))?;

        Ok(())
    }

    pub async fn db_rename_space(&self, id: &str, name: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE spaces SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            (name, id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to rename space: {}", e)))
    }

    /// Delete a space together with all of its pages
    pub async fn db_delete_space(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("DELETE FROM nodes WHERE space_id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete space nodes: {}", e))
            })?;

        conn.execute("DELETE FROM spaces WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete space: {}", e)))
    }

    //
    // NODE OPERATIONS
    //

    /// All pages of a space, unordered (the tree view sorts siblings)
    pub async fn db_list_nodes(&self, space_id: &str) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM nodes WHERE space_id = ? ORDER BY sort_order ASC",
                NODE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare list_nodes query: {}", e))
            })?;

        stmt.query([space_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute list_nodes query: {}", e))
        })
    }

    pub async fn db_get_node(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_node query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_node query: {}", e))
        })?;

        rows.next().await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to read get_node row: {}", e))
        })
    }

    /// Next creation-order slot among the siblings of `parent_id`
    ///
    /// Top-level pages (`parent_id = None`) are scoped to their space.
    pub async fn db_next_sort_order(
        &self,
        space_id: &str,
        parent_id: Option<&str>,
    ) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // `IS` compares NULL parents as equal
        let mut stmt = conn
            .prepare(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM nodes
                 WHERE space_id = ? AND parent_id IS ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare sort_order query: {}", e))
            })?;

        let mut rows = stmt.query((space_id, parent_id)).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute sort_order query: {}", e))
        })?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }

    pub async fn db_create_node(&self, params: DbCreateNodeParams<'_>) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO nodes (id, space_id, parent_id, name, content, is_open, is_pinned, sort_order)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.space_id,
                params.parent_id,
                params.name,
                params.content,
                params.is_open as i64,
                params.is_pinned as i64,
                params.sort_order,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;

        Ok(())
    }

    /// Update the provided columns of a node and refresh `updated_at`
    ///
    /// Returns the number of rows changed (0 when the id is unknown).
    pub async fn db_update_node(
        &self,
        id: &str,
        params: DbUpdateNodeParams<'_>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE nodes SET
                name = COALESCE(?, name),
                content = COALESCE(?, content),
                is_open = COALESCE(?, is_open),
                is_pinned = COALESCE(?, is_pinned),
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            (
                params.name,
                params.content,
                params.is_open.map(i64::from),
                params.is_pinned.map(i64::from),
                id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update node: {}", e)))
    }

    /// Delete a node and every descendant
    ///
    /// Walks the full subtree with a recursive CTE so the cascade does not
    /// depend on foreign-key enforcement. Idempotent: unknown ids delete 0 rows.
    pub async fn db_delete_node(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "WITH RECURSIVE subtree(id) AS (
                SELECT id FROM nodes WHERE id = ?
                UNION
                SELECT n.id FROM nodes n JOIN subtree s ON n.parent_id = s.id
             )
             DELETE FROM nodes WHERE id IN (SELECT id FROM subtree)",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))
    }

    //
    // IMAGE OPERATIONS
    //

    pub async fn db_create_image(&self, params: DbCreateImageParams<'_>) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO images (id, note_id, filename, original_name, path, size, mime_type)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.note_id,
                params.filename,
                params.original_name,
                params.path,
                params.size,
                params.mime_type,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert image: {}", e)))?;

        Ok(())
    }

    pub async fn db_get_image(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM images WHERE id = ?", IMAGE_COLUMNS))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_image query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_image query: {}", e))
        })?;

        rows.next().await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to read get_image row: {}", e))
        })
    }

    pub async fn db_delete_image(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("DELETE FROM images WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete image: {}", e)))
    }
}
