//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as strings,
//! enums as lowercase strings guarded by ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "things_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "uniqueness_guards",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE organization TYPE string;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD description ON TABLE organization TYPE string DEFAULT '';
DEFINE FIELD metadata ON TABLE organization TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_owner ON TABLE organization \
    COLUMNS owner_id;

-- =======================================================================
-- Groups (organization scope)
-- =======================================================================
DEFINE TABLE group SCHEMAFULL;
DEFINE FIELD org_id ON TABLE group TYPE string;
DEFINE FIELD name ON TABLE group TYPE string;
DEFINE FIELD description ON TABLE group TYPE string DEFAULT '';
DEFINE FIELD metadata ON TABLE group TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE group TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_group_org_name ON TABLE group \
    COLUMNS org_id, name UNIQUE;

-- =======================================================================
-- Profiles (group scope)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD group_id ON TABLE profile TYPE string;
DEFINE FIELD name ON TABLE profile TYPE string;
DEFINE FIELD config ON TABLE profile TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD metadata ON TABLE profile TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_profile_group ON TABLE profile COLUMNS group_id;

-- =======================================================================
-- Things (group scope)
-- =======================================================================
DEFINE TABLE thing SCHEMAFULL;
DEFINE FIELD group_id ON TABLE thing TYPE string;
DEFINE FIELD name ON TABLE thing TYPE string;
DEFINE FIELD auth_key ON TABLE thing TYPE string;
DEFINE FIELD external_keys ON TABLE thing TYPE array<string> DEFAULT [];
DEFINE FIELD metadata ON TABLE thing TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE thing TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE thing TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_thing_auth_key ON TABLE thing COLUMNS auth_key UNIQUE;
DEFINE INDEX idx_thing_group ON TABLE thing COLUMNS group_id;

-- =======================================================================
-- Connections (record id = thing id, so one connection per thing)
-- =======================================================================
DEFINE TABLE connection SCHEMAFULL;
DEFINE FIELD thing_id ON TABLE connection TYPE string;
DEFINE FIELD profile_id ON TABLE connection TYPE string;
DEFINE FIELD group_id ON TABLE connection TYPE string;
DEFINE FIELD created_at ON TABLE connection TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_connection_thing ON TABLE connection \
    COLUMNS thing_id UNIQUE;
DEFINE INDEX idx_connection_profile ON TABLE connection \
    COLUMNS profile_id;

-- =======================================================================
-- Group memberships (record id = group id + member id)
-- =======================================================================
DEFINE TABLE group_membership SCHEMAFULL;
DEFINE FIELD group_id ON TABLE group_membership TYPE string;
DEFINE FIELD member_id ON TABLE group_membership TYPE string;
DEFINE FIELD role ON TABLE group_membership TYPE string \
    ASSERT $value IN ['owner', 'editor', 'viewer'];
DEFINE FIELD created_at ON TABLE group_membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE group_membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_group_member ON TABLE group_membership \
    COLUMNS group_id, member_id UNIQUE;
DEFINE INDEX idx_membership_member ON TABLE group_membership \
    COLUMNS member_id;

-- =======================================================================
-- Group invites
-- =======================================================================
DEFINE TABLE group_invite SCHEMAFULL;
DEFINE FIELD group_id ON TABLE group_invite TYPE string;
DEFINE FIELD invitee_id ON TABLE group_invite TYPE option<string>;
DEFINE FIELD invitee_email ON TABLE group_invite TYPE string;
DEFINE FIELD inviter_id ON TABLE group_invite TYPE string;
DEFINE FIELD invitee_role ON TABLE group_invite TYPE string \
    ASSERT $value IN ['owner', 'editor', 'viewer'];
DEFINE FIELD state ON TABLE group_invite TYPE string \
    ASSERT $value IN ['pending', 'expired', 'revoked', 'accepted', \
    'declined'];
DEFINE FIELD created_at ON TABLE group_invite TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE group_invite TYPE datetime;
DEFINE INDEX idx_invite_group_inviter ON TABLE group_invite \
    COLUMNS group_id, inviter_id;
DEFINE INDEX idx_invite_invitee ON TABLE group_invite \
    COLUMNS invitee_id;

-- =======================================================================
-- Dormant group invite links (organization invite -> group invite)
-- =======================================================================
DEFINE TABLE dormant_group_invite SCHEMAFULL;
DEFINE FIELD org_invite_id ON TABLE dormant_group_invite TYPE string;
DEFINE FIELD group_invite_id ON TABLE dormant_group_invite TYPE string;
DEFINE FIELD group_id ON TABLE dormant_group_invite TYPE string;
DEFINE FIELD created_at ON TABLE dormant_group_invite TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_dormant_org_invite ON TABLE dormant_group_invite \
    COLUMNS org_invite_id;
DEFINE INDEX idx_dormant_group_invite ON TABLE dormant_group_invite \
    COLUMNS group_invite_id UNIQUE;
";

// -----------------------------------------------------------------------
// Schema v2
// -----------------------------------------------------------------------

// Rules that span rows are enforced through guard records whose record id is
// the unique tuple. A second CREATE of the same id fails inside the writing
// transaction, so concurrent writers cannot both pass.
const SCHEMA_V2: &str = "\
-- =======================================================================
-- Thing keys (record id = key value, internal and external alike)
-- =======================================================================
DEFINE TABLE thing_key SCHEMAFULL;
DEFINE FIELD thing_id ON TABLE thing_key TYPE string;
DEFINE FIELD group_id ON TABLE thing_key TYPE string;
DEFINE FIELD key_type ON TABLE thing_key TYPE string \
    ASSERT $value IN ['internal', 'external'];
DEFINE INDEX idx_thing_key_thing ON TABLE thing_key COLUMNS thing_id;
DEFINE INDEX idx_thing_key_group ON TABLE thing_key COLUMNS group_id;

-- =======================================================================
-- Pending invite guards (record id = group, inviter and invitee)
-- =======================================================================
DEFINE TABLE pending_invite SCHEMAFULL;
DEFINE FIELD invite_id ON TABLE pending_invite TYPE string;
DEFINE FIELD group_id ON TABLE pending_invite TYPE string;
DEFINE INDEX idx_pending_invite_invite ON TABLE pending_invite \
    COLUMNS invite_id;
DEFINE INDEX idx_pending_invite_group ON TABLE pending_invite \
    COLUMNS group_id;
";

/// Apply all pending migrations.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "failed to record v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
