//! Pointer chain resolution
//!
//! This is the only place that does address arithmetic on the target's
//! address space. Every hop is a checked read; a failed or null hop ends
//! resolution with [`ReadFailure::UnreadableMemory`].

use serde::Serialize;

use crate::error::ReadFailure;
use crate::layout::VersionProfile;
use crate::layout::offsets::suffix;
use crate::process::{ProcessInfo, ReadMemory};

/// Recipe for locating a value inside the target process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerChain {
    module: &'static str,
    base_address: u64,
    offsets: Vec<u64>,
}

impl PointerChain {
    pub fn new(module: &'static str, base_address: u64, offsets: Vec<u64>) -> Self {
        Self {
            module,
            base_address,
            offsets,
        }
    }

    /// Chain from a profile's static root through its prefix and then `suffix`
    pub fn from_profile(profile: &VersionProfile, suffix: &[u64]) -> Self {
        let offsets = profile
            .static_offset_prefix
            .iter()
            .chain(suffix)
            .copied()
            .collect();
        Self::new(profile.runtime_module, profile.static_base_address, offsets)
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Walk the chain and return the address of the final value.
    ///
    /// The pointer at `module + base_address` is read first; each offset but
    /// the last is added to the current pointer and dereferenced again; the
    /// last offset is added without a dereference. With no offsets the result
    /// is `module + base_address` itself.
    pub fn resolve<P>(&self, process: &P) -> Result<u64, ReadFailure>
    where
        P: ProcessInfo + ReadMemory,
    {
        let module_base = process.module_base(self.module).ok_or_else(|| {
            ReadFailure::unreadable(
                self.base_address,
                format!("Module {} is not loaded", self.module),
            )
        })?;
        let root = module_base.wrapping_add(self.base_address);

        let Some((&last, hops)) = self.offsets.split_last() else {
            return Ok(root);
        };

        let mut address = deref(process, root)?;
        for &offset in hops {
            address = deref(process, address.wrapping_add(offset))?;
        }
        Ok(address.wrapping_add(last))
    }

    pub fn read_i32<P>(&self, process: &P) -> Result<i32, ReadFailure>
    where
        P: ProcessInfo + ReadMemory,
    {
        let address = self.resolve(process)?;
        Ok(process.read_i32(address)?)
    }

    pub fn read_i64<P>(&self, process: &P) -> Result<i64, ReadFailure>
    where
        P: ProcessInfo + ReadMemory,
    {
        let address = self.resolve(process)?;
        Ok(process.read_i64(address)?)
    }

    pub fn read_bytes<P>(&self, process: &P, len: usize) -> Result<Vec<u8>, ReadFailure>
    where
        P: ProcessInfo + ReadMemory,
    {
        let address = self.resolve(process)?;
        Ok(process.read_bytes(address, len)?)
    }

    /// Read a null-terminated ASCII string of at most `max_len` bytes
    pub fn read_ascii<P>(&self, process: &P, max_len: usize) -> Result<String, ReadFailure>
    where
        P: ProcessInfo + ReadMemory,
    {
        let address = self.resolve(process)?;
        let bytes = process.read_c_string(address, max_len)?;
        if !bytes.is_ascii() {
            return Err(ReadFailure::MalformedValue(format!(
                "Non-ASCII string at 0x{:X}",
                address
            )));
        }
        // ASCII is valid UTF-8
        Ok(bytes.into_iter().map(char::from).collect())
    }
}

fn deref<R: ReadMemory>(reader: &R, address: u64) -> Result<u64, ReadFailure> {
    match reader.read_pointer(address)? {
        0 => Err(ReadFailure::unreadable(address, "Null pointer")),
        pointer => Ok(pointer),
    }
}

/// Every chain the introspector reads, built for one layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSet {
    pub music_coroutine: PointerChain,
    pub room_name: PointerChain,
    pub flags: PointerChain,
    pub first_music_id: PointerChain,
    pub battle_slot: PointerChain,
    pub battle_object: PointerChain,
    pub enemy_encounter: PointerChain,
}

impl ChainSet {
    pub fn build(profile: &VersionProfile) -> Self {
        Self {
            music_coroutine: PointerChain::from_profile(profile, suffix::MUSIC_COROUTINE),
            room_name: PointerChain::from_profile(profile, suffix::ROOM_NAME),
            flags: PointerChain::from_profile(profile, suffix::FLAGS),
            first_music_id: PointerChain::from_profile(profile, suffix::FIRST_MUSIC_ID),
            battle_slot: PointerChain::from_profile(profile, suffix::BATTLE_SLOT),
            battle_object: PointerChain::from_profile(profile, suffix::BATTLE_OBJECT),
            enemy_encounter: PointerChain::from_profile(profile, suffix::ENEMY_ENCOUNTER),
        }
    }
}
