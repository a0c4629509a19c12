//! Process provider abstraction for testability.
//!
//! These traits abstract process discovery and access so the introspector can
//! run against a mock process without a running game.

use std::cell::RefCell;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::process::ReadMemory;

/// A module loaded into the target process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    /// Module file name, e.g. `mono.dll`
    pub name: String,
    /// Address the module is mapped at
    pub base_address: u64,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, base_address: u64) -> Self {
        Self {
            name: name.into(),
            base_address,
        }
    }
}

/// Module list captured from a process, refreshed when a lookup misses.
///
/// The game is usually found before Unity has loaded its runtime module, so a
/// list taken at open time goes stale. A miss re-enumerates once and keeps the
/// fresh list.
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: RefCell<Vec<ModuleInfo>>,
}

impl ModuleTable {
    pub fn new(modules: Vec<ModuleInfo>) -> Self {
        Self {
            modules: RefCell::new(modules),
        }
    }

    /// Modules as last enumerated, in load order
    pub fn snapshot(&self) -> Vec<ModuleInfo> {
        self.modules.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }

    /// Base address of `name` (ASCII case-insensitive).
    ///
    /// On a miss, `enumerate` is called once and its result replaces the table.
    pub fn base_of<F>(&self, name: &str, enumerate: F) -> Option<u64>
    where
        F: FnOnce() -> Result<Vec<ModuleInfo>>,
    {
        if let Some(base) = find_base(&self.modules.borrow(), name) {
            return Some(base);
        }

        match enumerate() {
            Ok(fresh) => {
                let base = find_base(&fresh, name);
                if base.is_some() {
                    debug!("Module {} loaded after open", name);
                }
                *self.modules.borrow_mut() = fresh;
                base
            }
            Err(e) => {
                debug!("Failed to re-enumerate modules: {}", e);
                None
            }
        }
    }
}

fn find_base(modules: &[ModuleInfo], name: &str) -> Option<u64> {
    modules
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.base_address)
}

/// Trait for accessing process information.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Modules loaded in the process as last enumerated, in load order.
    fn modules(&self) -> Vec<ModuleInfo>;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;

    /// Base address of a loaded module, compared ignoring ASCII case.
    ///
    /// Modules loaded after the process was opened are found too.
    fn module_base(&self, name: &str) -> Option<u64>;

    /// Module names in load order.
    fn module_names(&self) -> Vec<String> {
        self.modules().into_iter().map(|m| m.name).collect()
    }
}

/// Trait for finding and opening processes.
pub trait ProcessProvider {
    /// The type of process returned by this provider.
    type Process: ProcessInfo + ReadMemory;

    /// Query the OS process table for a process with the given name.
    ///
    /// Called on every poll, so a process that exited is observed as `None`
    /// on the next call.
    fn find_process_id(&self, name: &str) -> Option<u32>;

    /// Open a process by its PID.
    fn open_process(&self, pid: u32) -> Result<Self::Process>;
}

/// Check whether an executable name from the process table names `target`.
///
/// The comparison ignores a trailing `.exe` and ASCII case, so `Bug Fables.exe`
/// matches `Bug Fables`.
pub fn process_name_matches(exe_name: &str, target: &str) -> bool {
    let stem = exe_name
        .len()
        .checked_sub(4)
        .filter(|&split| {
            exe_name.is_char_boundary(split) && exe_name[split..].eq_ignore_ascii_case(".exe")
        })
        .map_or(exe_name, |split| &exe_name[..split]);
    stem.eq_ignore_ascii_case(target)
}
