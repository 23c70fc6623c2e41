//! Opening the things store.
//!
//! The server talks to a remote SurrealDB over WebSocket. [`open_store`]
//! signs in, selects the things namespace, brings the schema up to date
//! and hands back a [`SurrealStore`] ready to serve requests.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;
use crate::store::SurrealStore;

/// The `[db]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub url: String,
    /// Namespace shared by every deployment of the things service.
    pub namespace: String,
    /// Database holding the registry: things, profiles, groups and the
    /// records that link them.
    pub database: String,
    /// Root user the service signs in as.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "localhost:8000".into(),
            namespace: "things".into(),
            database: "registry".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Connect to the configured SurrealDB, apply pending migrations and wrap
/// the client in a [`SurrealStore`].
pub async fn open_store(config: &DbConfig) -> Result<SurrealStore<Client>, DbError> {
    info!(
        url = %config.url,
        namespace = %config.namespace,
        database = %config.database,
        "Opening things store"
    );

    let db = Surreal::new::<Ws>(&config.url).await?;
    db.signin(Root {
        username: config.username.clone(),
        password: config.password.clone(),
    })
    .await?;
    db.use_ns(&config.namespace)
        .use_db(&config.database)
        .await?;

    run_migrations(&db).await?;
    info!(database = %config.database, "Things store ready");

    Ok(SurrealStore::new(db))
}
