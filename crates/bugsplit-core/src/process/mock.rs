//! Mock process and memory for testing
//!
//! Provides configurable stand-ins for the OS process table and a target
//! process's address space, so the introspector can be exercised without the
//! game running.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::process::provider::ModuleTable;
use crate::process::{ModuleInfo, ProcessInfo, ProcessProvider, ReadMemory, process_name_matches};

/// Sparse mock address space
///
/// Only bytes that were written are readable; any read touching an unwritten
/// byte fails the way an unmapped page does in a real process.
#[derive(Debug, Clone, Default)]
pub struct MockMemory {
    bytes: HashMap<u64, u8>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes at an absolute address
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.bytes.insert(address + i as u64, b);
        }
    }

    /// Make a range unreadable again
    pub fn unmap(&mut self, address: u64, len: usize) {
        for i in 0..len as u64 {
            self.bytes.remove(&(address + i));
        }
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (0..size as u64)
            .map(|i| {
                let at = address.wrapping_add(i);
                self.bytes
                    .get(&at)
                    .copied()
                    .ok_or_else(|| Error::MemoryReadFailed {
                        address,
                        message: format!("Unmapped byte at 0x{:X}", at),
                    })
            })
            .collect()
    }
}

/// Builder for creating test memory layouts
///
/// Provides a fluent API for constructing memory layouts for testing.
#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    memory: MockMemory,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a signed 32-bit integer at an absolute address
    pub fn write_i32(mut self, address: u64, value: i32) -> Self {
        self.memory.write_bytes(address, &value.to_le_bytes());
        self
    }

    /// Write a signed 64-bit integer at an absolute address
    pub fn write_i64(mut self, address: u64, value: i64) -> Self {
        self.memory.write_bytes(address, &value.to_le_bytes());
        self
    }

    /// Write a pointer-sized value at an absolute address
    pub fn write_pointer(mut self, address: u64, value: u64) -> Self {
        self.memory.write_bytes(address, &value.to_le_bytes());
        self
    }

    /// Write raw bytes at an absolute address
    pub fn write_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        self.memory.write_bytes(address, bytes);
        self
    }

    /// Write a null-terminated string, padded with zeros to `capacity` bytes
    pub fn write_c_string(mut self, address: u64, text: &str, capacity: usize) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(capacity.max(bytes.len() + 1), 0);
        self.memory.write_bytes(address, &bytes);
        self
    }

    pub fn build(self) -> MockMemory {
        self.memory
    }
}

/// A fake target process
///
/// Clones share the same memory, liveness and loaded-module list, so a test
/// can keep a handle to a process that has been handed to the introspector and
/// mutate it live. Each opened process keeps its own view of the modules, taken
/// at open time and refreshed on lookup misses, as a real handle does.
#[derive(Debug, Clone)]
pub struct MockProcess {
    pid: u32,
    exe_name: String,
    loaded: Rc<RefCell<Vec<ModuleInfo>>>,
    modules: ModuleTable,
    memory: Rc<RefCell<MockMemory>>,
    alive: Rc<Cell<bool>>,
}

impl MockProcess {
    pub fn new(pid: u32, exe_name: impl Into<String>) -> Self {
        Self {
            pid,
            exe_name: exe_name.into(),
            loaded: Rc::new(RefCell::new(Vec::new())),
            modules: ModuleTable::default(),
            memory: Rc::new(RefCell::new(MockMemory::new())),
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Add a module that is loaded before the process is opened
    pub fn with_module(mut self, name: &str, base_address: u64) -> Self {
        self.loaded
            .borrow_mut()
            .push(ModuleInfo::new(name, base_address));
        self.modules = ModuleTable::new(self.loaded.borrow().clone());
        self
    }

    /// Load a module into the live process, after it may have been opened
    pub fn load_module(&self, name: &str, base_address: u64) {
        self.loaded
            .borrow_mut()
            .push(ModuleInfo::new(name, base_address));
    }

    /// A handle to this process with its module view captured now
    fn opened(&self) -> Self {
        let mut process = self.clone();
        process.modules = ModuleTable::new(self.loaded.borrow().clone());
        process
    }

    /// Replace the address space
    pub fn with_memory(self, memory: MockMemory) -> Self {
        *self.memory.borrow_mut() = memory;
        self
    }

    pub fn exe_name(&self) -> &str {
        &self.exe_name
    }

    /// Write raw bytes into the live address space
    pub fn write_bytes(&self, address: u64, bytes: &[u8]) {
        self.memory.borrow_mut().write_bytes(address, bytes);
    }

    /// Write a pointer into the live address space
    pub fn write_pointer(&self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Make a range of the live address space unreadable
    pub fn unmap(&self, address: u64, len: usize) {
        self.memory.borrow_mut().unmap(address, len);
    }

    fn exit(&self) {
        self.alive.set(false);
    }
}

impl ProcessInfo for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.snapshot()
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn module_base(&self, name: &str) -> Option<u64> {
        self.modules.base_of(name, || {
            if !self.is_alive() {
                return Err(Error::ProcessOpenFailed(format!(
                    "Mock process {} has exited",
                    self.pid
                )));
            }
            Ok(self.loaded.borrow().clone())
        })
    }
}

impl ReadMemory for MockProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if !self.is_alive() {
            return Err(Error::MemoryReadFailed {
                address,
                message: "Process has exited".to_string(),
            });
        }
        self.memory.borrow().read_bytes(address, size)
    }
}

#[derive(Debug, Default)]
struct MockProcessTable {
    running: Option<MockProcess>,
    lookups: usize,
    opens: usize,
    fail_open: bool,
}

/// Mock process table
///
/// Clones share the same table, so a test keeps one handle while the
/// introspector owns another.
#[derive(Debug, Clone, Default)]
pub struct MockProcessProvider {
    table: Rc<RefCell<MockProcessTable>>,
}

impl MockProcessProvider {
    /// Create a provider with an empty process table
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a process in the table, replacing (and terminating) any previous one
    pub fn launch(&self, process: MockProcess) {
        let mut table = self.table.borrow_mut();
        if let Some(previous) = table.running.replace(process) {
            previous.exit();
        }
    }

    /// Remove the running process from the table and mark it exited
    pub fn terminate(&self) {
        if let Some(process) = self.table.borrow_mut().running.take() {
            process.exit();
        }
    }

    /// Make subsequent `open_process` calls fail
    pub fn set_open_failure(&self, fail: bool) {
        self.table.borrow_mut().fail_open = fail;
    }

    /// Number of process table lookups so far
    pub fn lookup_count(&self) -> usize {
        self.table.borrow().lookups
    }

    /// Number of successful opens so far
    pub fn open_count(&self) -> usize {
        self.table.borrow().opens
    }
}

impl ProcessProvider for MockProcessProvider {
    type Process = MockProcess;

    fn find_process_id(&self, name: &str) -> Option<u32> {
        let mut table = self.table.borrow_mut();
        table.lookups += 1;
        table
            .running
            .as_ref()
            .filter(|p| process_name_matches(&p.exe_name, name))
            .map(|p| p.pid)
    }

    fn open_process(&self, pid: u32) -> Result<Self::Process> {
        let mut table = self.table.borrow_mut();
        if table.fail_open {
            return Err(Error::ProcessOpenFailed(format!(
                "Mock open failure for PID {}",
                pid
            )));
        }
        let process = table
            .running
            .as_ref()
            .filter(|p| p.pid == pid)
            .map(MockProcess::opened)
            .ok_or_else(|| Error::ProcessNotFound(format!("Mock process {} not found", pid)))?;
        table.opens += 1;
        Ok(process)
    }
}
