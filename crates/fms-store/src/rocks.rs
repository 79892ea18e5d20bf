//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use fms_core::{MatchId, TeamId};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Match, MatchStatus, MatchType, Team};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Team Operations
    // =========================================================================

    fn put_team(&self, team: &Team) -> Result<()> {
        let cf = self.cf(cf::TEAMS)?;
        let key = keys::team_key(team.id);
        let value = Self::serialize(team)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(team = %team.id, "Stored team");
        Ok(())
    }

    fn get_team(&self, team_id: TeamId) -> Result<Option<Team>> {
        let cf = self.cf(cf::TEAMS)?;
        let key = keys::team_key(team_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_team(&self, team_id: TeamId) -> Result<()> {
        if self.get_team(team_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let cf = self.cf(cf::TEAMS)?;
        self.db
            .delete_cf(&cf, keys::team_key(team_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        let cf = self.cf(cf::TEAMS)?;

        let mut teams = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            teams.push(Self::deserialize(&value)?);
        }

        Ok(teams)
    }

    // =========================================================================
    // Match Operations
    // =========================================================================

    fn put_match(&self, record: &Match) -> Result<()> {
        let cf_matches = self.cf(cf::MATCHES)?;
        let cf_by_type = self.cf(cf::MATCHES_BY_TYPE)?;

        let match_key = keys::match_key(record.id);
        let type_match_key = keys::type_match_key(record.match_type, record.id);
        let value = Self::serialize(record)?;

        // A rescheduled match may have changed type; drop the stale index entry.
        let old_type = self
            .db
            .get_cf(&cf_matches, &match_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<Match>(&data))
            .transpose()?
            .map(|m| m.match_type);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_matches, &match_key, &value);

        if let Some(old) = old_type {
            if old != record.match_type {
                batch.delete_cf(&cf_by_type, keys::type_match_key(old, record.id));
            }
        }
        batch.put_cf(&cf_by_type, &type_match_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        let cf = self.cf(cf::MATCHES)?;
        let key = keys::match_key(match_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_match(&self, match_id: MatchId) -> Result<()> {
        let cf_matches = self.cf(cf::MATCHES)?;
        let cf_by_type = self.cf(cf::MATCHES_BY_TYPE)?;

        let record = self.get_match(match_id)?.ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_matches, keys::match_key(match_id));
        batch.delete_cf(&cf_by_type, keys::type_match_key(record.match_type, match_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_matches_by_type(&self, match_type: MatchType) -> Result<Vec<Match>> {
        let cf_by_type = self.cf(cf::MATCHES_BY_TYPE)?;
        let prefix = keys::type_prefix(match_type);

        let mut matches = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_type,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }

            let match_id = keys::extract_match_id_from_type_match_key(&key);
            if let Some(record) = self.get_match(match_id)? {
                matches.push(record);
            }
        }

        Ok(matches)
    }

    fn update_match_status(&self, match_id: MatchId, status: MatchStatus) -> Result<()> {
        let mut record = self.get_match(match_id)?.ok_or(StoreError::NotFound)?;
        record.status = status;
        self.put_match(&record)
    }
}
