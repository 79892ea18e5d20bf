//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Team records, keyed by team number.
    pub const TEAMS: &str = "teams";

    /// Primary match records, keyed by `match_id`.
    pub const MATCHES: &str = "matches";

    /// Index: matches by type, keyed by `type || match_id`.
    pub const MATCHES_BY_TYPE: &str = "matches_by_type";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::TEAMS, cf::MATCHES, cf::MATCHES_BY_TYPE]
}
