//! Deterministic entity id derivation.
//!
//! Ids are derived from an entity's identifying fields: base64-encode the
//! name (joined to the parent id with `:` when there is one) and keep the
//! first 22 characters. Recomputing the id of a candidate entity is how
//! creation probes for an existing record before inserting.

use base64::{engine::general_purpose::STANDARD, Engine};

pub const DERIVED_ID_LEN: usize = 22;

/// Derive the id for an entity from its name and optional parent id.
///
/// Same inputs always produce the same output. Truncation means long
/// inputs that share a 22-char encoded prefix collide; that is accepted
/// behavior and creation treats a collision as "already exists".
pub fn derive_id(name: &str, parent_id: Option<&str>) -> String {
    let mut encoded = match parent_id {
        Some(parent_id) => STANDARD.encode(format!("{}:{}", name, parent_id)),
        None => STANDARD.encode(name),
    };
    encoded.truncate(DERIVED_ID_LEN);
    encoded
}
