//! Key encoding utilities for `RocksDB`.
//!
//! All numeric keys are big-endian so that lexicographic iteration order
//! matches numeric order.

use fms_core::{MatchId, TeamId};

use crate::types::MatchType;

/// Encode a team key (the team number).
#[must_use]
pub fn team_key(team_id: TeamId) -> Vec<u8> {
    team_id.to_be_bytes().to_vec()
}

/// Encode a match key (the match id).
#[must_use]
pub fn match_key(match_id: MatchId) -> Vec<u8> {
    match_id.to_be_bytes().to_vec()
}

/// Encode a type-match index key: `type || match_id`.
///
/// Prefix scans over a type yield matches in id order.
#[must_use]
pub fn type_match_key(match_type: MatchType, match_id: MatchId) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(match_type.as_u8());
    key.extend_from_slice(&match_id.to_be_bytes());
    key
}

/// Encode a type prefix for scanning all matches of a type.
#[must_use]
pub fn type_prefix(match_type: MatchType) -> Vec<u8> {
    vec![match_type.as_u8()]
}

/// Extract the match ID from a type-match key.
///
/// # Panics
///
/// Panics if the key is not at least 9 bytes.
#[must_use]
pub fn extract_match_id_from_type_match_key(key: &[u8]) -> MatchId {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[1..9]);
    MatchId::from_be_bytes(bytes)
}
