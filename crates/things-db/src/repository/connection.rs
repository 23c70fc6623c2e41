//! SurrealDB implementation of [`ConnectionRepository`].
//!
//! Connection records are keyed by thing id, so the record-id collision on
//! `CREATE` enforces the one-connection-per-thing rule.

use surrealdb::{Connection as SurrealConnection, Surreal};
use surrealdb_types::SurrealValue;
use things_core::error::ThingsResult;
use things_core::models::connection::Connection;
use things_core::repository::ConnectionRepository;
use tracing::debug;
use uuid::Uuid;

use super::parse_id;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
pub(super) struct ConnectionRow {
    thing_id: String,
    profile_id: String,
}

impl ConnectionRow {
    pub(super) fn try_into_connection(self) -> Result<Connection, DbError> {
        Ok(Connection {
            thing_id: parse_id(&self.thing_id, "thing")?,
            profile_id: parse_id(&self.profile_id, "profile")?,
        })
    }
}

/// SurrealDB implementation of the Connection repository.
#[derive(Clone)]
pub struct SurrealConnectionRepository<C: SurrealConnection> {
    db: Surreal<C>,
}

impl<C: SurrealConnection> SurrealConnectionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: SurrealConnection> ConnectionRepository for SurrealConnectionRepository<C> {
    async fn connect(
        &self,
        group_id: Uuid,
        profile_id: Uuid,
        thing_id: Uuid,
    ) -> ThingsResult<Connection> {
        let thing_id_str = thing_id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('connection', $thing_id) SET \
                 thing_id = $thing_id, profile_id = $profile_id, \
                 group_id = $group_id",
            )
            .bind(("thing_id", thing_id_str.clone()))
            .bind(("profile_id", profile_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(|e| DbError::from_write("connection", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("connection", e))?;

        let rows: Vec<ConnectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("connection", &thing_id_str))?;

        debug!(%thing_id, %profile_id, "Thing connected");
        Ok(row.try_into_connection()?)
    }

    async fn disconnect(&self, profile_id: Uuid, thing_id: Uuid) -> ThingsResult<()> {
        let thing_id_str = thing_id.to_string();

        let mut result = self
            .db
            .query(
                "DELETE type::record('connection', $thing_id) \
                 WHERE profile_id = $profile_id RETURN BEFORE",
            )
            .bind(("thing_id", thing_id_str.clone()))
            .bind(("profile_id", profile_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConnectionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("connection", &thing_id_str).into());
        }

        debug!(%thing_id, %profile_id, "Thing disconnected");
        Ok(())
    }

    async fn retrieve_by_thing(&self, thing_id: Uuid) -> ThingsResult<Connection> {
        let thing_id_str = thing_id.to_string();

        let mut result = self
            .db
            .query("SELECT thing_id, profile_id FROM type::record('connection', $thing_id)")
            .bind(("thing_id", thing_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConnectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("connection", &thing_id_str))?;

        Ok(row.try_into_connection()?)
    }
}
