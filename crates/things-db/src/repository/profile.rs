//! SurrealDB implementation of [`ProfileRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection as SurrealConnection, Surreal};
use surrealdb_types::SurrealValue;
use things_core::error::ThingsResult;
use things_core::models::connection::Connection;
use things_core::models::profile::{CreateProfile, Profile};
use things_core::repository::ProfileRepository;
use uuid::Uuid;

use super::connection::ConnectionRow;
use super::{empty_object, parse_id};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    group_id: String,
    name: String,
    config: serde_json::Value,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        Ok(Profile {
            id,
            group_id: parse_id(&self.group_id, "group")?,
            name: self.name,
            config: self.config,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: SurrealConnection> {
    db: Surreal<C>,
}

impl<C: SurrealConnection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: SurrealConnection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, input: CreateProfile) -> ThingsResult<Profile> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 group_id = $group_id, name = $name, \
                 config = $config, metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("name", input.name))
            .bind(("config", input.config.unwrap_or_else(empty_object)))
            .bind(("metadata", input.metadata.unwrap_or_else(empty_object)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("profile", e))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("profile", &id_str))?;

        Ok(row.into_profile(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ThingsResult<Profile> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("profile", &id_str))?;

        Ok(row.into_profile(id)?)
    }

    async fn delete(&self, id: Uuid) -> ThingsResult<Vec<Connection>> {
        let mut result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE connection WHERE profile_id = $id RETURN BEFORE; \
                 DELETE type::record('profile', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<ConnectionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ConnectionRow::try_into_connection)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
