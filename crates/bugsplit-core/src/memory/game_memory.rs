//! Attach/detach lifecycle and typed reads against the game process
//!
//! ## Example
//!
//! ```ignore
//! use bugsplit_core::{GameMemory, IntrospectorConfig};
//!
//! let mut memory = GameMemory::system(IntrospectorConfig::default());
//! loop {
//!     memory.poll_attachment();
//!     if let Ok(room) = memory.read_room_id() {
//!         println!("room {}", room);
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! ```

use tracing::{debug, info, warn};

use crate::config::{IntrospectorConfig, target};
use crate::diagnostics::DiagnosticLog;
use crate::error::ReadFailure;
use crate::layout::offsets::encounter;
use crate::layout::{Detection, GameVersion, VersionProfile, detect_version};
use crate::memory::chain::ChainSet;
use crate::memory::values::{EncounterTable, FlagSet, parse_room_id};
use crate::process::{ProcessInfo, ProcessProvider, SystemProcessProvider};
use crate::snapshot::GameSnapshot;

/// Result of reconciling the attachment with the process table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentChange {
    /// A new process was found and attached
    Attached,
    /// The attached process disappeared from the process table
    Detached,
    /// Nothing changed since the last poll
    Unchanged,
}

impl AttachmentChange {
    pub fn is_changed(self) -> bool {
        self != AttachmentChange::Unchanged
    }
}

/// Everything that exists only while attached
#[derive(Debug)]
pub struct Attachment<T> {
    process: T,
    detection: Detection,
    chains: ChainSet,
}

impl<T: ProcessInfo> Attachment<T> {
    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    pub fn process(&self) -> &T {
        &self.process
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }

    pub fn version(&self) -> GameVersion {
        self.detection.version
    }

    pub fn profile(&self) -> &'static VersionProfile {
        self.detection.profile()
    }

    pub fn chains(&self) -> &ChainSet {
        &self.chains
    }
}

#[derive(Debug)]
enum AttachmentState<T> {
    Detached,
    Attached(Attachment<T>),
}

/// Introspector for one game process at a time
///
/// Poll [`poll_attachment`](Self::poll_attachment) once per tick, then call
/// the `read_*` methods. Reads never panic on bad memory; they fail for the
/// current tick only.
pub struct GameMemory<P: ProcessProvider = SystemProcessProvider> {
    provider: P,
    config: IntrospectorConfig,
    diagnostics: Option<DiagnosticLog>,
    state: AttachmentState<P::Process>,
}

impl GameMemory<SystemProcessProvider> {
    /// Introspector backed by the OS process table
    pub fn system(config: IntrospectorConfig) -> Self {
        Self::new(SystemProcessProvider::new(), config)
    }
}

impl<P: ProcessProvider> GameMemory<P> {
    pub fn new(provider: P, config: IntrospectorConfig) -> Self {
        let diagnostics = config.diagnostic_log.as_ref().map(DiagnosticLog::new);
        Self {
            provider,
            config,
            diagnostics,
            state: AttachmentState::Detached,
        }
    }

    pub fn config(&self) -> &IntrospectorConfig {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, AttachmentState::Attached(_))
    }

    pub fn attachment(&self) -> Option<&Attachment<P::Process>> {
        match &self.state {
            AttachmentState::Attached(attachment) => Some(attachment),
            AttachmentState::Detached => None,
        }
    }

    /// Layout of the attached process
    pub fn version(&self) -> Option<GameVersion> {
        self.attachment().map(Attachment::version)
    }

    /// Reconcile the attachment with the current process table.
    ///
    /// The table is queried by name on every call. A fresh attach runs version
    /// detection and builds the pointer chains; a fresh detach drops them.
    /// While attached, the layout is not re-detected. A process that exited and
    /// came back under a new PID between two polls counts as a detach, and the
    /// following poll attaches to the new one.
    pub fn poll_attachment(&mut self) -> AttachmentChange {
        let found = self.provider.find_process_id(&self.config.process_name);
        let attached = self
            .attachment()
            .map(|a| (a.pid(), a.process().is_alive()));

        match (attached, found) {
            (None, None) => AttachmentChange::Unchanged,
            (None, Some(pid)) => self.attach(pid),
            (Some((pid, true)), Some(found_pid)) if pid == found_pid => AttachmentChange::Unchanged,
            (Some((pid, _)), Some(found_pid)) => {
                // Restarted between polls; the old handle is stale
                info!(
                    "{} (PID {}) was replaced by PID {}, detaching",
                    self.config.process_name, pid, found_pid
                );
                self.reset();
                AttachmentChange::Detached
            }
            (Some((pid, _)), None) => {
                info!("{} (PID {}) is gone, detaching", self.config.process_name, pid);
                self.reset();
                AttachmentChange::Detached
            }
        }
    }

    /// Drop the process handle, layout and chains.
    ///
    /// The next poll re-attaches (and re-detects) if the process is still running.
    pub fn reset(&mut self) {
        if self.is_attached() {
            debug!("Resetting attachment");
        }
        self.state = AttachmentState::Detached;
    }

    fn attach(&mut self, pid: u32) -> AttachmentChange {
        let process = match self.provider.open_process(pid) {
            Ok(process) => process,
            Err(e) => {
                warn!(
                    "Found {} (PID {}) but could not open it: {}",
                    self.config.process_name, pid, e
                );
                return AttachmentChange::Unchanged;
            }
        };

        let module_names = process.module_names();
        let detection = detect_version(module_names.iter().map(String::as_str));
        self.record_detection(&detection);
        let chains = ChainSet::build(detection.profile());

        info!(
            "Attached to {} (PID {}), layout {}",
            self.config.process_name, pid, detection.version
        );
        self.state = AttachmentState::Attached(Attachment {
            process,
            detection,
            chains,
        });
        AttachmentChange::Attached
    }

    fn record_detection(&self, detection: &Detection) {
        let message = detection.message();
        if detection.fallback {
            warn!("{}", message);
        } else {
            info!("{}", message);
        }

        if let Some(log) = &self.diagnostics
            && let Err(e) = log.append(&message)
        {
            warn!(
                "Failed to write diagnostic log {}: {}",
                log.path().display(),
                e
            );
        }
    }

    fn attached(&self) -> Result<&Attachment<P::Process>, ReadFailure> {
        self.attachment().ok_or(ReadFailure::NotAttached)
    }

    /// Story flags, `profile.flags_len` bytes
    pub fn read_flag_bitset(&self) -> Result<FlagSet, ReadFailure> {
        let a = self.attached()?;
        let bytes = a.chains.flags.read_bytes(&a.process, a.profile().flags_len)?;
        Ok(FlagSet::new(bytes))
    }

    /// Numeric id of the current room, parsed from the map object's name
    pub fn read_room_id(&self) -> Result<i32, ReadFailure> {
        let a = self.attached()?;
        let name = a
            .chains
            .room_name
            .read_ascii(&a.process, target::ROOM_NAME_MAX_LEN)?;
        parse_room_id(&name)
    }

    /// First entry of the music id array
    pub fn read_first_music_id(&self) -> Result<i32, ReadFailure> {
        let a = self.attached()?;
        a.chains.first_music_id.read_i32(&a.process)
    }

    /// Handle of the running music coroutine (0 when none)
    pub fn read_music_coroutine_handle(&self) -> Result<i64, ReadFailure> {
        let a = self.attached()?;
        a.chains.music_coroutine.read_i64(&a.process)
    }

    /// Native battle object pointer, or 0 before a battle object exists.
    ///
    /// The battle slot always exists but its object is allocated lazily, so a
    /// failed object read falls back to the slot itself. Only when the slot is
    /// unreadable too does the read fail.
    pub fn read_battle_pointer(&self) -> Result<i64, ReadFailure> {
        let a = self.attached()?;
        match a.chains.battle_object.read_i64(&a.process) {
            Ok(pointer) => Ok(pointer),
            Err(object_failure) => {
                a.chains.battle_slot.read_i64(&a.process).map_err(|slot_failure| {
                    debug!(
                        "Battle object unreadable ({}), slot unreadable too",
                        object_failure
                    );
                    slot_failure
                })?;
                Ok(0)
            }
        }
    }

    /// Raw per-enemy encounter table
    pub fn read_enemy_encounter_table(&self) -> Result<EncounterTable, ReadFailure> {
        let a = self.attached()?;
        let bytes = a
            .chains
            .enemy_encounter
            .read_bytes(&a.process, encounter::TABLE_LEN)?;
        EncounterTable::from_bytes(bytes)
    }

    /// Read every tracked value once; `None` while detached
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        let attachment = self.attachment()?;
        Some(GameSnapshot {
            pid: attachment.pid(),
            version: attachment.version(),
            room_id: read_or_none(self.read_room_id(), "room id"),
            first_music_id: read_or_none(self.read_first_music_id(), "music id"),
            music_coroutine: read_or_none(self.read_music_coroutine_handle(), "music coroutine"),
            battle_pointer: read_or_none(self.read_battle_pointer(), "battle pointer"),
            flags: read_or_none(self.read_flag_bitset(), "flags"),
            encounters: read_or_none(self.read_enemy_encounter_table(), "enemy encounters"),
        })
    }
}

/// Convert a failed read into `None`, logging why.
fn read_or_none<T>(result: Result<T, ReadFailure>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Failed to read {}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcess, MockProcessProvider};

    fn memory_with(provider: &MockProcessProvider) -> GameMemory<MockProcessProvider> {
        GameMemory::new(provider.clone(), IntrospectorConfig::default())
    }

    #[test]
    fn test_starts_detached() {
        let provider = MockProcessProvider::new();
        let memory = memory_with(&provider);

        assert!(!memory.is_attached());
        assert_eq!(memory.version(), None);
        assert!(memory.snapshot().is_none());
    }

    #[test]
    fn test_absent_process_is_unchanged() {
        let provider = MockProcessProvider::new();
        let mut memory = memory_with(&provider);

        assert_eq!(memory.poll_attachment(), AttachmentChange::Unchanged);
        assert!(!memory.is_attached());
        assert_eq!(memory.read_room_id(), Err(ReadFailure::NotAttached));
    }

    #[test]
    fn test_open_failure_stays_detached_and_retries() {
        let provider = MockProcessProvider::new();
        provider.launch(MockProcess::new(7, "Bug Fables.exe").with_module("mono.dll", 0x1000_0000));
        provider.set_open_failure(true);
        let mut memory = memory_with(&provider);

        assert_eq!(memory.poll_attachment(), AttachmentChange::Unchanged);
        assert!(!memory.is_attached());

        provider.set_open_failure(false);
        assert_eq!(memory.poll_attachment(), AttachmentChange::Attached);
        assert_eq!(memory.version(), Some(GameVersion::V110));
    }

    #[test]
    fn test_attach_selects_profile_and_chains() {
        let provider = MockProcessProvider::new();
        provider.launch(
            MockProcess::new(7, "Bug Fables.exe").with_module("mono-2.0-bdwgc.dll", 0x1000_0000),
        );
        let mut memory = memory_with(&provider);

        assert_eq!(memory.poll_attachment(), AttachmentChange::Attached);
        let attachment = memory.attachment().unwrap();
        assert_eq!(attachment.pid(), 7);
        assert_eq!(attachment.version(), GameVersion::V113MonoBleedingEdge);
        assert!(!attachment.detection().fallback);
        assert_eq!(
            attachment.chains(),
            &ChainSet::build(GameVersion::V113MonoBleedingEdge.profile())
        );
    }

    #[test]
    fn test_reset_then_poll_reattaches() {
        let provider = MockProcessProvider::new();
        provider.launch(MockProcess::new(7, "Bug Fables.exe"));
        let mut memory = memory_with(&provider);

        memory.poll_attachment();
        memory.reset();
        assert!(!memory.is_attached());
        assert_eq!(memory.read_flag_bitset(), Err(ReadFailure::NotAttached));

        assert_eq!(memory.poll_attachment(), AttachmentChange::Attached);
        assert_eq!(provider.open_count(), 2);
    }

    #[test]
    fn test_restart_between_polls_detaches_first() {
        let provider = MockProcessProvider::new();
        provider.launch(MockProcess::new(7, "Bug Fables.exe").with_module("mono.dll", 0x1000_0000));
        let mut memory = memory_with(&provider);
        memory.poll_attachment();

        provider.launch(
            MockProcess::new(8, "Bug Fables.exe").with_module("mono-2.0-bdwgc.dll", 0x1000_0000),
        );
        assert_eq!(memory.poll_attachment(), AttachmentChange::Detached);
        assert_eq!(memory.read_room_id(), Err(ReadFailure::NotAttached));

        assert_eq!(memory.poll_attachment(), AttachmentChange::Attached);
        assert_eq!(memory.attachment().unwrap().pid(), 8);
        assert_eq!(memory.version(), Some(GameVersion::V113MonoBleedingEdge));
    }

    #[test]
    fn test_attachment_change_is_changed() {
        assert!(AttachmentChange::Attached.is_changed());
        assert!(AttachmentChange::Detached.is_changed());
        assert!(!AttachmentChange::Unchanged.is_changed());
    }

    #[test]
    fn test_read_or_none() {
        assert_eq!(read_or_none::<i32>(Ok(3), "x"), Some(3));
        assert_eq!(read_or_none::<i32>(Err(ReadFailure::NotAttached), "x"), None);
    }
}
