//! Structural offsets shared by every supported layout
//!
//! A version profile only describes how to reach the MainManager static
//! object. Everything below that anchor is identical across builds and lives
//! here.
//!
//! # Structure Overview
//!
//! ```text
//! runtime module + static base
//!   └─ version prefix ──────────► MainManager statics
//!        +0x10  instance ───────► MainManager instance
//!        |        +0x160 flags ─► bool[]   (+0x20 first element)
//!        |        +0x190 enemy ─► int[]    (+0x20 first element)
//!        +0x20  map ────────────► Unity object ─► cached native ptr ─► name chars
//!        +0x40  battle ─────────► BattleControl (lazily allocated)
//!        +0x58  music coroutine handle (i64)
//!        +0x160 music ids ──────► int[]    (+0x20 first element)
//! ```

/// Offsets off the MainManager static object
pub mod statics {
    pub const INSTANCE: u64 = 0x10;
    pub const MAP: u64 = 0x20;
    pub const BATTLE: u64 = 0x40;
    pub const MUSIC_COROUTINE: u64 = 0x58;
    pub const MUSIC_ID_ARRAY: u64 = 0x160;
}

/// Offsets off the MainManager instance
pub mod instance {
    pub const FLAGS_ARRAY: u64 = 0x160;
    pub const ENEMY_ENCOUNTER_ARRAY: u64 = 0x190;
}

/// Managed array header
pub mod array {
    /// Offset of element 0 from the start of a managed array object
    pub const FIRST_ELEMENT: u64 = 0x20;
}

/// Unity native object layout
pub mod unity {
    /// `m_CachedPtr`: managed wrapper to native object
    pub const CACHED_PTR: u64 = 0x10;

    /// Native object to its name characters
    pub const GAME_OBJECT_NAME: [u64; 4] = [CACHED_PTR, 0x30, 0x60, 0x0];
}

/// Enemy encounter table layout
///
/// ```text
/// Offset        Field          Size
/// ─────────────────────────────────
/// id*8 + 0      encountered    4
/// id*8 + 4      defeated       4
/// ```
pub mod encounter {
    pub const ENEMY_SLOTS: usize = 256;
    pub const FIELD_SIZE: usize = 4;
    pub const STRIDE: usize = FIELD_SIZE * 2;
    pub const ENCOUNTERED: usize = 0;
    pub const DEFEATED: usize = FIELD_SIZE;
    pub const TABLE_LEN: usize = ENEMY_SLOTS * STRIDE;
}

/// Chain suffixes appended to a profile's prefix, one per tracked value
pub mod suffix {
    use super::{array, instance, statics, unity};

    pub const MUSIC_COROUTINE: &[u64] = &[statics::MUSIC_COROUTINE];

    pub const ROOM_NAME: &[u64] = &[
        statics::MAP,
        unity::GAME_OBJECT_NAME[0],
        unity::GAME_OBJECT_NAME[1],
        unity::GAME_OBJECT_NAME[2],
        unity::GAME_OBJECT_NAME[3],
    ];

    pub const FLAGS: &[u64] = &[
        statics::INSTANCE,
        instance::FLAGS_ARRAY,
        array::FIRST_ELEMENT,
    ];

    pub const FIRST_MUSIC_ID: &[u64] = &[statics::MUSIC_ID_ARRAY, array::FIRST_ELEMENT];

    pub const BATTLE_SLOT: &[u64] = &[statics::BATTLE];

    pub const BATTLE_OBJECT: &[u64] = &[statics::BATTLE, unity::CACHED_PTR];

    pub const ENEMY_ENCOUNTER: &[u64] = &[
        statics::INSTANCE,
        instance::ENEMY_ENCOUNTER_ARRAY,
        array::FIRST_ELEMENT,
    ];
}
