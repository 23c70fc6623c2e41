//! Cache key schema shared by every backend.
//!
//! | Key | Type | Value |
//! |---|---|---|
//! | `id_by_key:<type>:<key>` | string | thing id |
//! | `keys_by_id:<thing>` | set | `<type>:<key>` members |
//! | `gr_by_th:<thing>` | string | group id |
//! | `ths_by_gr:<group>` | set | thing ids |
//! | `pr_by_th:<thing>` | string | profile id |
//! | `gr_by_pr:<profile>` | string | group id |
//! | `prs_by_gr:<group>` | set | profile ids |
//! | `org_by_gr:<group>` | string | organization id |
//! | `grs_by_mb:<member>` | hash | group id → role |
//! | `mbs_by_gr:<group>` | set | member ids |

use things_core::models::thing::ThingKey;
use uuid::Uuid;

pub fn id_by_key(key: &ThingKey) -> String {
    format!("id_by_key:{key}")
}

/// `id_by_key` entry for a `keys_by_id` set member.
pub fn id_by_key_member(member: &str) -> String {
    format!("id_by_key:{member}")
}

/// Member recorded in `keys_by_id` for `key`.
pub fn key_member(key: &ThingKey) -> String {
    key.to_string()
}

pub fn keys_by_id(thing_id: Uuid) -> String {
    format!("keys_by_id:{thing_id}")
}

pub fn group_by_thing(thing_id: Uuid) -> String {
    format!("gr_by_th:{thing_id}")
}

pub fn things_by_group(group_id: Uuid) -> String {
    format!("ths_by_gr:{group_id}")
}

pub fn profile_by_thing(thing_id: Uuid) -> String {
    format!("pr_by_th:{thing_id}")
}

pub fn group_by_profile(profile_id: Uuid) -> String {
    format!("gr_by_pr:{profile_id}")
}

pub fn profiles_by_group(group_id: Uuid) -> String {
    format!("prs_by_gr:{group_id}")
}

pub fn org_by_group(group_id: Uuid) -> String {
    format!("org_by_gr:{group_id}")
}

pub fn groups_by_member(member_id: Uuid) -> String {
    format!("grs_by_mb:{member_id}")
}

pub fn members_by_group(group_id: Uuid) -> String {
    format!("mbs_by_gr:{group_id}")
}
