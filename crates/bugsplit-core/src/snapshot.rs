//! One tick's worth of game state

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::layout::GameVersion;
use crate::memory::{EncounterTable, EnemyRecord, FlagSet};

/// Every tracked value read in one tick.
///
/// `None` means the read failed this tick; it says nothing about the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub pid: u32,
    pub version: GameVersion,
    pub room_id: Option<i32>,
    pub first_music_id: Option<i32>,
    pub music_coroutine: Option<i64>,
    pub battle_pointer: Option<i64>,
    pub flags: Option<FlagSet>,
    pub encounters: Option<EncounterTable>,
}

/// A difference between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotChange {
    Room { from: Option<i32>, to: Option<i32> },
    Music { from: Option<i32>, to: Option<i32> },
    MusicCoroutine { from: Option<i64>, to: Option<i64> },
    BattlePointer { from: Option<i64>, to: Option<i64> },
    Flag { index: usize, set: bool },
    Enemy(EnemyRecord),
}

impl fmt::Display for SnapshotChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotChange::Room { from, to } => {
                write!(f, "room {} -> {}", Shown(from), Shown(to))
            }
            SnapshotChange::Music { from, to } => {
                write!(f, "music {} -> {}", Shown(from), Shown(to))
            }
            SnapshotChange::MusicCoroutine { from, to } => {
                write!(f, "music coroutine {} -> {}", Hex(from), Hex(to))
            }
            SnapshotChange::BattlePointer { from, to } => {
                write!(f, "battle pointer {} -> {}", Hex(from), Hex(to))
            }
            SnapshotChange::Flag { index, set } => {
                write!(f, "flag {} {}", index, if *set { "set" } else { "cleared" })
            }
            SnapshotChange::Enemy(record) => write!(
                f,
                "enemy {}: encountered {}, defeated {}",
                record.enemy_id, record.encountered, record.defeated
            ),
        }
    }
}

struct Shown<'a>(&'a Option<i32>);

impl fmt::Display for Shown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("?"),
        }
    }
}

struct Hex<'a>(&'a Option<i64>);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:#x}", value),
            None => f.write_str("?"),
        }
    }
}

impl GameSnapshot {
    /// Changes from `previous` to `self`.
    ///
    /// Scalars are compared including unknown values. Flags and encounter
    /// counters are only compared when both ticks read them.
    pub fn changes_since(&self, previous: &GameSnapshot) -> Vec<SnapshotChange> {
        let mut changes = Vec::new();

        if self.room_id != previous.room_id {
            changes.push(SnapshotChange::Room {
                from: previous.room_id,
                to: self.room_id,
            });
        }
        if self.first_music_id != previous.first_music_id {
            changes.push(SnapshotChange::Music {
                from: previous.first_music_id,
                to: self.first_music_id,
            });
        }
        if self.music_coroutine != previous.music_coroutine {
            changes.push(SnapshotChange::MusicCoroutine {
                from: previous.music_coroutine,
                to: self.music_coroutine,
            });
        }
        if self.battle_pointer != previous.battle_pointer {
            changes.push(SnapshotChange::BattlePointer {
                from: previous.battle_pointer,
                to: self.battle_pointer,
            });
        }

        if let (Some(now), Some(before)) = (&self.flags, &previous.flags) {
            changes.extend(
                now.changes_since(before)
                    .into_iter()
                    .map(|(index, set)| SnapshotChange::Flag { index, set }),
            );
        }
        if let (Some(now), Some(before)) = (&self.encounters, &previous.encounters) {
            changes.extend(
                now.changes_since(before)
                    .into_iter()
                    .map(SnapshotChange::Enemy),
            );
        }

        changes
    }

    /// Single-line JSON, as emitted by `watch --json`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::offsets::encounter;

    fn snapshot() -> GameSnapshot {
        GameSnapshot {
            pid: 100,
            version: GameVersion::V110,
            room_id: Some(12),
            first_music_id: Some(3),
            music_coroutine: Some(0),
            battle_pointer: Some(0),
            flags: Some(FlagSet::new(vec![0; 8])),
            encounters: Some(EncounterTable::from_bytes(vec![0; encounter::TABLE_LEN]).unwrap()),
        }
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let s = snapshot();
        assert!(s.changes_since(&s.clone()).is_empty());
    }

    #[test]
    fn test_scalar_changes() {
        let before = snapshot();
        let mut after = snapshot();
        after.room_id = Some(13);
        after.battle_pointer = None;

        assert_eq!(
            after.changes_since(&before),
            vec![
                SnapshotChange::Room {
                    from: Some(12),
                    to: Some(13)
                },
                SnapshotChange::BattlePointer {
                    from: Some(0),
                    to: None
                },
            ]
        );
    }

    #[test]
    fn test_flag_and_enemy_changes() {
        let before = snapshot();
        let mut after = snapshot();
        let mut flags = vec![0; 8];
        flags[5] = 1;
        after.flags = Some(FlagSet::new(flags));
        let mut table = vec![0; encounter::TABLE_LEN];
        table[3 * 8] = 1;
        after.encounters = Some(EncounterTable::from_bytes(table).unwrap());

        assert_eq!(
            after.changes_since(&before),
            vec![
                SnapshotChange::Flag { index: 5, set: true },
                SnapshotChange::Enemy(EnemyRecord {
                    enemy_id: 3,
                    encountered: 1,
                    defeated: 0
                }),
            ]
        );
    }

    #[test]
    fn test_unknown_flags_are_not_diffed() {
        let before = snapshot();
        let mut after = snapshot();
        after.flags = None;

        assert!(after.changes_since(&before).is_empty());
    }

    #[test]
    fn test_change_display() {
        let change = SnapshotChange::Room {
            from: None,
            to: Some(4),
        };
        assert_eq!(change.to_string(), "room ? -> 4");

        let change = SnapshotChange::BattlePointer {
            from: Some(0),
            to: Some(0x1F00),
        };
        assert_eq!(change.to_string(), "battle pointer 0x0 -> 0x1f00");

        let change = SnapshotChange::Flag {
            index: 9,
            set: false,
        };
        assert_eq!(change.to_string(), "flag 9 cleared");
    }

    #[test]
    fn test_to_json() {
        let mut s = snapshot();
        s.flags = Some(FlagSet::new(vec![0, 1]));
        s.room_id = None;

        let value: serde_json::Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(value["pid"], 100);
        assert_eq!(value["version"], "V110");
        assert!(value["room_id"].is_null());
        assert_eq!(value["flags"], serde_json::json!([1]));
        assert_eq!(value["encounters"], serde_json::json!([]));
    }
}
