pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod memory;
pub mod process;
pub mod snapshot;

pub use config::IntrospectorConfig;
pub use diagnostics::DiagnosticLog;
pub use error::{Error, ReadFailure, Result};
pub use layout::{Detection, GameVersion, VersionProfile, detect_version, profiles};
pub use memory::{
    AttachmentChange, ChainSet, EncounterTable, EnemyRecord, FlagSet, GameMemory, PointerChain,
    decode_defeat_count, decode_encounter_count,
};
pub use process::{ProcessHandle, ProcessInfo, ProcessProvider, ReadMemory, SystemProcessProvider};
pub use snapshot::{GameSnapshot, SnapshotChange};
