//! LibsqlStore - NodeStore over the embedded libsql database
//!
//! Thin wrapper that delegates SQL to `DatabaseService` and converts rows
//! into model structs. `row_to_*` helpers are the single conversion point for
//! every query.

use crate::db::database::{
    DatabaseService, DbCreateImageParams, DbCreateNodeParams, DbUpdateNodeParams,
};
use crate::db::node_store::NodeStore;
use crate::models::{Attachment, Node, NodeUpdate, Space};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use std::sync::Arc;

pub struct LibsqlStore {
    db: Arc<DatabaseService>,
}

impl LibsqlStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Parse timestamp from the database
    ///
    /// Accepts the SQLite `CURRENT_TIMESTAMP` format and RFC3339.
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    fn row_to_space(row: &Row) -> Result<Space> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let sort_order: i64 = row.get(2).context("Failed to get sort_order")?;
        let created_at: String = row.get(3).context("Failed to get created_at")?;
        let updated_at: String = row.get(4).context("Failed to get updated_at")?;

        Ok(Space {
            id,
            name,
            sort_order,
            created_at: Self::parse_timestamp(&created_at).context("Failed to parse created_at")?,
            updated_at: Self::parse_timestamp(&updated_at).context("Failed to parse updated_at")?,
        })
    }

    /// Convert a `nodes` row (see `NODE_COLUMNS`) into a `Node`
    ///
    /// NULL content reads as an empty string.
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let space_id: String = row.get(1).context("Failed to get space_id")?;
        let parent_id: Option<String> = row.get(2).context("Failed to get parent_id")?;
        let name: String = row.get(3).context("Failed to get name")?;
        let content: Option<String> = row.get(4).context("Failed to get content")?;
        let is_open: i64 = row.get(5).context("Failed to get is_open")?;
        let is_pinned: i64 = row.get(6).context("Failed to get is_pinned")?;
        let sort_order: i64 = row.get(7).context("Failed to get sort_order")?;
        let created_at: String = row.get(8).context("Failed to get created_at")?;
        let updated_at: String = row.get(9).context("Failed to get updated_at")?;

        Ok(Node {
            id,
            space_id,
            parent_id,
            name,
            content: content.unwrap_or_default(),
            is_open: is_open != 0,
            is_pinned: is_pinned != 0,
            sort_order,
            created_at: Self::parse_timestamp(&created_at).context("Failed to parse created_at")?,
            updated_at: Self::parse_timestamp(&updated_at).context("Failed to parse updated_at")?,
        })
    }

    fn row_to_attachment(row: &Row) -> Result<Attachment> {
        let created_at: String = row.get(7).context("Failed to get created_at")?;

        Ok(Attachment {
            id: row.get(0).context("Failed to get id")?,
            note_id: row.get(1).context("Failed to get note_id")?,
            filename: row.get(2).context("Failed to get filename")?,
            original_name: row.get(3).context("Failed to get original_name")?,
            path: row.get(4).context("Failed to get path")?,
            size: row.get(5).context("Failed to get size")?,
            mime_type: row.get(6).context("Failed to get mime_type")?,
            created_at: Self::parse_timestamp(&created_at).context("Failed to parse created_at")?,
        })
    }
}

#[async_trait]
impl NodeStore for LibsqlStore {
    async fn list_spaces(&self) -> Result<Vec<Space>> {
        let mut rows = self
            .db
            .db_list_spaces()
            .await
            .context("Failed to list spaces")?;

        let mut spaces = Vec::new();
        while let Some(row) = rows.next().await? {
            spaces.push(Self::row_to_space(&row)?);
        }
        Ok(spaces)
    }

    async fn get_space(&self, id: &str) -> Result<Option<Space>> {
        let row = self
            .db
            .db_get_space(id)
            .await
            .with_context(|| format!("Failed to get space '{}'", id))?;

        row.as_ref().map(Self::row_to_space).transpose()
    }

    async fn create_space(&self, space: Space) -> Result<Space> {
        self.db
            .db_create_space(&space.id, &space.name, space.sort_order)
            .await
            .context("Failed to create space")?;

        self.get_space(&space.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Space '{}' missing after insert", space.id))
    }

    async fn rename_space(&self, id: &str, name: &str) -> Result<bool> {
        let changed = self
            .db
            .db_rename_space(id, name)
            .await
            .with_context(|| format!("Failed to rename space '{}'", id))?;
        Ok(changed > 0)
    }

    async fn delete_space(&self, id: &str) -> Result<()> {
        self.db
            .db_delete_space(id)
            .await
            .with_context(|| format!("Failed to delete space '{}'", id))?;
        Ok(())
    }

    async fn list_nodes(&self, space_id: &str) -> Result<Vec<Node>> {
        let mut rows = self
            .db
            .db_list_nodes(space_id)
            .await
            .with_context(|| format!("Failed to list nodes of space '{}'", space_id))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let row = self
            .db
            .db_get_node(id)
            .await
            .with_context(|| format!("Failed to get node '{}'", id))?;

        row.as_ref().map(Self::row_to_node).transpose()
    }

    async fn create_node(&self, node: Node) -> Result<Node> {
        let sort_order = self
            .db
            .db_next_sort_order(&node.space_id, node.parent_id.as_deref())
            .await
            .context("Failed to compute sort order")?;

        self.db
            .db_create_node(DbCreateNodeParams {
                id: &node.id,
                space_id: &node.space_id,
                parent_id: node.parent_id.as_deref(),
                name: &node.name,
                content: &node.content,
                is_open: node.is_open,
                is_pinned: node.is_pinned,
                sort_order,
            })
            .await
            .context("Failed to create node")?;

        self.get_node(&node.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Node '{}' missing after insert", node.id))
    }

    async fn update_node(&self, id: &str, update: NodeUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(self.get_node(id).await?.is_some());
        }

        let changed = self
            .db
            .db_update_node(
                id,
                DbUpdateNodeParams {
                    name: update.name.as_deref(),
                    content: update.content.as_deref(),
                    is_open: update.is_open,
                    is_pinned: update.is_pinned,
                },
            )
            .await
            .with_context(|| format!("Failed to update node '{}'", id))?;

        Ok(changed > 0)
    }

    async fn delete_node(&self, id: &str) -> Result<()> {
        self.db
            .db_delete_node(id)
            .await
            .with_context(|| format!("Failed to delete node '{}'", id))?;
        Ok(())
    }

    async fn create_attachment(&self, attachment: Attachment) -> Result<Attachment> {
        self.db
            .db_create_image(DbCreateImageParams {
                id: &attachment.id,
                note_id: attachment.note_id.as_deref(),
                filename: &attachment.filename,
                original_name: &attachment.original_name,
                path: &attachment.path,
                size: attachment.size,
                mime_type: attachment.mime_type.as_deref(),
            })
            .await
            .context("Failed to record attachment")?;

        self.get_attachment(&attachment.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Attachment '{}' missing after insert", attachment.id))
    }

    async fn get_attachment(&self, id: &str) -> Result<Option<Attachment>> {
        let row = self
            .db
            .db_get_image(id)
            .await
            .with_context(|| format!("Failed to get attachment '{}'", id))?;

        row.as_ref().map(Self::row_to_attachment).transpose()
    }

    async fn delete_attachment(&self, id: &str) -> Result<bool> {
        let removed = self
            .db
            .db_delete_image(id)
            .await
            .with_context(|| format!("Failed to delete attachment '{}'", id))?;
        Ok(removed > 0)
    }
}
