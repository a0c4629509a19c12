//! CLI command implementations.

pub mod profiles;
pub mod status;
pub mod watch;

use std::fmt::Display;

use bugsplit_core::GameSnapshot;

fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// One-line human summary of a snapshot
pub fn describe_snapshot(snapshot: &GameSnapshot) -> String {
    let flags = snapshot
        .flags
        .as_ref()
        .map(|f| f.set_indices().count());
    let enemies = snapshot
        .encounters
        .as_ref()
        .map(|t| t.records().count());
    format!(
        "room {}, music {}, music coroutine {}, battle {}, flags set {}, enemies seen {}",
        or_unknown(snapshot.room_id),
        or_unknown(snapshot.first_music_id),
        or_unknown(snapshot.music_coroutine.map(|v| format!("{:#x}", v))),
        or_unknown(snapshot.battle_pointer.map(|v| format!("{:#x}", v))),
        or_unknown(flags),
        or_unknown(enemies),
    )
}
