//! SQLite implementation of `GraphStore`
//!
//! One `SqliteUnitOfWork` wraps one open transaction. Reads through it see
//! its own uncommitted writes; nothing is visible to other connections until
//! `commit()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::domain::graph::{
    Entity, GraphStore, InsertOutcome, NewRelationship, Relationship, RelationshipKey,
};
use crate::error::{Error, Result};

/// A graph unit of work backed by a SQLite transaction
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteUnitOfWork {
    /// Open a transaction on the pool
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    /// Persist every write made through this unit of work
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard every write made through this unit of work
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for SqliteUnitOfWork {
    // ========== Entity Operations ==========

    async fn get_entity(&mut self, id: &str, domain: &str) -> Result<Option<Entity>> {
        let row: Option<EntityRow> = sqlx::query_as(&format!(
            "SELECT {} FROM entities WHERE id = ? AND domain = ?",
            ENTITY_COLUMNS
        ))
        .bind(id)
        .bind(domain)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(EntityRow::into_entity))
    }

    async fn entity_exists(&mut self, id: &str, domain: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM entities WHERE id = ? AND domain = ?")
                .bind(id)
                .bind(domain)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row.is_some())
    }

    async fn insert_entity(&mut self, entity: &Entity) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO entities (id, domain, name, type, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id, domain) DO NOTHING
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.domain)
        .bind(&entity.name)
        .bind(&entity.entity_type)
        .bind(&entity.description)
        .bind(entity.created_at.to_rfc3339())
        .bind(entity.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            debug!(entity_id = %entity.id, domain = %entity.domain, "Entity insert hit existing key");
            return Ok(InsertOutcome::Duplicate);
        }
        debug!(entity_id = %entity.id, domain = %entity.domain, "Entity inserted");
        Ok(InsertOutcome::Inserted(0))
    }

    async fn update_entity(&mut self, entity: &Entity) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE entities
            SET name = ?, type = ?, description = ?, updated_at = ?
            WHERE id = ? AND domain = ?
            "#,
        )
        .bind(&entity.name)
        .bind(&entity.entity_type)
        .bind(&entity.description)
        .bind(entity.updated_at.to_rfc3339())
        .bind(&entity.id)
        .bind(&entity.domain)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::EntityNotFound(format!(
                "{} (domain '{}')",
                entity.id, entity.domain
            )));
        }
        Ok(())
    }

    async fn list_entities(&mut self, domain: &str) -> Result<Vec<Entity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(&format!(
            "SELECT {} FROM entities WHERE domain = ? ORDER BY id",
            ENTITY_COLUMNS
        ))
        .bind(domain)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(EntityRow::into_entity).collect())
    }

    // ========== Relationship Operations ==========

    async fn get_relationship(&mut self, key: &RelationshipKey) -> Result<Option<Relationship>> {
        let row: Option<RelationshipRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM relationships
            WHERE source_id = ? AND target_id = ? AND type = ? AND domain = ?
            "#,
            RELATIONSHIP_COLUMNS
        ))
        .bind(&key.source_id)
        .bind(&key.target_id)
        .bind(&key.relationship_type)
        .bind(&key.domain)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(RelationshipRow::into_relationship))
    }

    async fn insert_relationship(
        &mut self,
        relationship: &NewRelationship,
    ) -> Result<InsertOutcome> {
        let key = &relationship.key;
        let result = sqlx::query(
            r#"
            INSERT INTO relationships (source_id, target_id, type, description, domain, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(source_id, target_id, type, domain) DO NOTHING
            "#,
        )
        .bind(&key.source_id)
        .bind(&key.target_id)
        .bind(&key.relationship_type)
        .bind(&relationship.description)
        .bind(&key.domain)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        Ok(InsertOutcome::Inserted(result.last_insert_rowid()))
    }

    async fn update_relationship_description(
        &mut self,
        id: i64,
        description: &str,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE relationships SET description = ? WHERE id = ?")
            .bind(description)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::EntityNotFound(format!("relationship {}", id)));
        }
        Ok(())
    }

    async fn list_relationships(&mut self, domain: &str) -> Result<Vec<Relationship>> {
        let rows: Vec<RelationshipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM relationships WHERE domain = ? ORDER BY id",
            RELATIONSHIP_COLUMNS
        ))
        .bind(domain)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(RelationshipRow::into_relationship).collect())
    }

    // ========== Bulk Operations ==========

    async fn clear_domain(&mut self, domain: &str) -> Result<(u64, u64)> {
        let relationships = sqlx::query("DELETE FROM relationships WHERE domain = ?")
            .bind(domain)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        let entities = sqlx::query("DELETE FROM entities WHERE domain = ?")
            .bind(domain)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        info!(domain = %domain, entities, relationships, "Domain cleared");
        Ok((entities, relationships))
    }
}

// ========== Database Row Types ==========

const ENTITY_COLUMNS: &str =
    "id, domain, name, type AS entity_type, description, created_at, updated_at";

const RELATIONSHIP_COLUMNS: &str =
    "id, source_id, target_id, type AS relationship_type, description, domain, created_at";

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[derive(Debug, FromRow)]
struct EntityRow {
    id: String,
    domain: String,
    name: String,
    entity_type: String,
    description: String,
    created_at: String,
    updated_at: String,
}

impl EntityRow {
    fn into_entity(self) -> Entity {
        Entity {
            id: self.id,
            name: self.name,
            entity_type: self.entity_type,
            description: self.description,
            domain: self.domain,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

#[derive(Debug, FromRow)]
struct RelationshipRow {
    id: i64,
    source_id: String,
    target_id: String,
    relationship_type: String,
    description: String,
    domain: String,
    created_at: String,
}

impl RelationshipRow {
    fn into_relationship(self) -> Relationship {
        Relationship {
            id: self.id,
            source_id: self.source_id,
            target_id: self.target_id,
            relationship_type: self.relationship_type,
            description: self.description,
            domain: self.domain,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}
