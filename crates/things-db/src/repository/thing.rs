//! SurrealDB implementation of [`ThingRepository`].
//!
//! Every key a thing holds, internal or external, owns a `thing_key` record
//! whose id is the key itself. The key records are written in the same
//! transaction as the thing, so a key can never resolve to two things.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use things_core::error::ThingsResult;
use things_core::models::thing::{CreateThing, Thing, ThingKey};
use things_core::repository::ThingRepository;
use tracing::debug;
use uuid::Uuid;

use super::{empty_object, parse_id};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ThingRow {
    group_id: String,
    name: String,
    auth_key: String,
    external_keys: Vec<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ThingRow {
    fn into_thing(self, id: Uuid) -> Result<Thing, DbError> {
        Ok(Thing {
            id,
            group_id: parse_id(&self.group_id, "group")?,
            name: self.name,
            key: self.auth_key,
            external_keys: self.external_keys,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct KeyRow {
    thing_id: String,
}

const CREATE_THING: &str = "\
BEGIN TRANSACTION;
FOR $key IN $keys {
    CREATE type::record('thing_key', $key) SET
        thing_id = $id, group_id = $group_id,
        key_type = IF $key = $auth_key THEN 'internal' ELSE 'external' END;
};
CREATE type::record('thing', $id) SET
    group_id = $group_id, name = $name,
    auth_key = $auth_key, external_keys = $external_keys,
    metadata = $metadata;
COMMIT TRANSACTION;";

const DELETE_THING: &str = "\
BEGIN TRANSACTION;
DELETE type::record('connection', $id);
DELETE thing_key WHERE thing_id = $id;
DELETE type::record('thing', $id);
COMMIT TRANSACTION;";

/// SurrealDB implementation of the Thing repository.
#[derive(Clone)]
pub struct SurrealThingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealThingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ThingRepository for SurrealThingRepository<C> {
    async fn create(&self, input: CreateThing) -> ThingsResult<Thing> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let key = input.key.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut keys = Vec::with_capacity(input.external_keys.len() + 1);
        keys.push(key.clone());
        for external in &input.external_keys {
            if keys.contains(external) {
                return Err(DbError::Conflict {
                    entity: "thing".into(),
                    detail: format!("key '{external}' given twice"),
                }
                .into());
            }
            keys.push(external.clone());
        }

        let result = self
            .db
            .query(CREATE_THING)
            .bind(("id", id_str.clone()))
            .bind(("keys", keys))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("name", input.name))
            .bind(("auth_key", key))
            .bind(("external_keys", input.external_keys))
            .bind(("metadata", input.metadata.unwrap_or_else(empty_object)))
            .await
            .map_err(|e| DbError::from_write("thing", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("thing", e))?;

        let rows: Vec<ThingRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("thing", &id_str))?;

        Ok(row.into_thing(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ThingsResult<Thing> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('thing', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ThingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("thing", &id_str))?;

        Ok(row.into_thing(id)?)
    }

    async fn get_by_key(&self, key: &ThingKey) -> ThingsResult<Thing> {
        let mut result = self
            .db
            .query(
                "SELECT thing_id FROM type::record('thing_key', $key) \
                 WHERE key_type = $key_type",
            )
            .bind(("key", key.value.clone()))
            .bind(("key_type", key.key_type.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<KeyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("thing", key.key_type.as_str()))?;

        self.get_by_id(parse_id(&row.thing_id, "thing")?).await
    }

    async fn delete(&self, id: Uuid) -> ThingsResult<()> {
        debug!(thing_id = %id, "Deleting thing");

        self.db
            .query(DELETE_THING)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }
}
