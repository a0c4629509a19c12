//! Reading the game's state
//!
//! - [`PointerChain`] / [`ChainSet`]: address recipes and their resolution
//! - [`GameMemory`]: the attach/detach lifecycle plus typed reads
//! - [`FlagSet`] / [`EncounterTable`]: views over raw buffers

mod chain;
mod game_memory;
mod values;

pub use chain::{ChainSet, PointerChain};
pub use game_memory::{Attachment, AttachmentChange, GameMemory};
pub use values::{
    EncounterTable, EnemyRecord, FlagSet, decode_defeat_count, decode_encounter_count,
    parse_room_id,
};
