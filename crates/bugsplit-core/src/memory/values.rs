//! Typed views over raw buffers read from the game

use serde::{Serialize, Serializer};

use crate::error::ReadFailure;
use crate::layout::offsets::encounter;

/// Raw story flag array, one byte per flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    bytes: Vec<u8>,
}

impl FlagSet {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether flag `index` is set, or `None` past the end of the array
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bytes.get(index).map(|&b| b != 0)
    }

    /// Indices of all set flags
    pub fn set_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bytes
            .iter()
            .enumerate()
            .filter(|(_, b)| **b != 0)
            .map(|(i, _)| i)
    }

    /// Flags whose value differs from `previous`, with their new value
    pub fn changes_since(&self, previous: &FlagSet) -> Vec<(usize, bool)> {
        (0..self.len().max(previous.len()))
            .filter_map(|i| {
                let now = self.get(i).unwrap_or(false);
                let before = previous.get(i).unwrap_or(false);
                (now != before).then_some((i, now))
            })
            .collect()
    }
}

impl Serialize for FlagSet {
    /// Serialized as the list of set flag indices
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.set_indices())
    }
}

/// Extract the defeated counter for `enemy_id` from a raw encounter table.
///
/// Each enemy occupies two little-endian `i32` fields: encountered, then
/// defeated, so the defeated counter sits at `enemy_id * 8 + 4`.
pub fn decode_defeat_count(table: &[u8; encounter::TABLE_LEN], enemy_id: u8) -> i32 {
    read_field(table, enemy_id, encounter::DEFEATED)
}

/// Extract the encountered counter for `enemy_id` (at `enemy_id * 8`).
pub fn decode_encounter_count(table: &[u8; encounter::TABLE_LEN], enemy_id: u8) -> i32 {
    read_field(table, enemy_id, encounter::ENCOUNTERED)
}

fn read_field(table: &[u8; encounter::TABLE_LEN], enemy_id: u8, field: usize) -> i32 {
    let at = enemy_id as usize * encounter::STRIDE + field;
    i32::from_le_bytes([table[at], table[at + 1], table[at + 2], table[at + 3]])
}

/// Per-enemy encounter counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterTable {
    raw: Box<[u8; encounter::TABLE_LEN]>,
}

/// Counters for one enemy slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnemyRecord {
    pub enemy_id: u8,
    pub encountered: i32,
    pub defeated: i32,
}

impl EncounterTable {
    /// Wrap a buffer read from the game; it must be exactly the table length
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ReadFailure> {
        let len = bytes.len();
        let raw: Box<[u8; encounter::TABLE_LEN]> =
            bytes.into_boxed_slice().try_into().map_err(|_| {
                ReadFailure::MalformedValue(format!(
                    "Encounter table is {} bytes, expected {}",
                    len,
                    encounter::TABLE_LEN
                ))
            })?;
        Ok(Self { raw })
    }

    pub fn as_bytes(&self) -> &[u8; encounter::TABLE_LEN] {
        &self.raw
    }

    pub fn defeated(&self, enemy_id: u8) -> i32 {
        decode_defeat_count(&self.raw, enemy_id)
    }

    pub fn encountered(&self, enemy_id: u8) -> i32 {
        decode_encounter_count(&self.raw, enemy_id)
    }

    pub fn record(&self, enemy_id: u8) -> EnemyRecord {
        EnemyRecord {
            enemy_id,
            encountered: self.encountered(enemy_id),
            defeated: self.defeated(enemy_id),
        }
    }

    /// Records for every slot with a non-zero counter
    pub fn records(&self) -> impl Iterator<Item = EnemyRecord> + '_ {
        (0..=u8::MAX)
            .map(|id| self.record(id))
            .filter(|r| r.encountered != 0 || r.defeated != 0)
    }

    /// Slots whose counters differ from `previous`
    pub fn changes_since(&self, previous: &EncounterTable) -> Vec<EnemyRecord> {
        (0..=u8::MAX)
            .map(|id| self.record(id))
            .filter(|r| previous.record(r.enemy_id) != *r)
            .collect()
    }
}

impl Serialize for EncounterTable {
    /// Serialized as the list of non-empty slots
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records())
    }
}

/// Parse a room name such as `"42"` into its numeric id
pub fn parse_room_id(name: &str) -> Result<i32, ReadFailure> {
    name.trim()
        .parse()
        .map_err(|_| ReadFailure::MalformedValue(format!("Room name {:?} is not a number", name)))
}
