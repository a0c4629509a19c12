#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use tracing::debug;

use crate::error::{Error, Result};
use crate::process::provider::{ModuleInfo, ModuleTable, ProcessInfo, ProcessProvider};

#[cfg(target_os = "windows")]
use crate::process::provider::process_name_matches;
#[cfg(target_os = "windows")]
use tracing::warn;

#[cfg(target_os = "windows")]
use std::ffi::OsString;
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE, HMODULE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::ProcessStatus::{
    EnumProcessModulesEx, GetModuleBaseNameW, GetModuleInformation, LIST_MODULES_ALL, MODULEINFO,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Upper bound on modules enumerated per process
#[cfg(target_os = "windows")]
const MAX_MODULES: usize = 1024;

#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    pub pid: u32,
    modules: ModuleTable,
}

#[cfg(not(target_os = "windows"))]
pub struct ProcessHandle {
    pub pid: u32,
    modules: ModuleTable,
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Open a process for reading and capture its module list.
    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid access flags and a PID from the
        // process snapshot. The returned handle is owned by this struct and closed in Drop.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid).map_err(|e| {
                debug!("OpenProcess failed for PID {}: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?
        };

        // Construct first so the handle is closed by Drop if enumeration fails.
        let mut process = Self {
            handle,
            pid,
            modules: ModuleTable::default(),
        };
        process.modules = ModuleTable::new(enumerate_modules(handle)?);
        debug!("PID {} has {} modules loaded", pid, process.modules.len());

        Ok(process)
    }

    pub fn handle(&self) -> HANDLE {
        self.handle
    }

    fn enumerate_modules(&self) -> Result<Vec<ModuleInfo>> {
        enumerate_modules(self.handle)
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle obtained from
        // OpenProcess and a properly initialized out parameter.
        unsafe {
            if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessOpenFailed(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn is_alive(&self) -> bool {
        false
    }

    fn enumerate_modules(&self) -> Result<Vec<ModuleInfo>> {
        Err(Error::ProcessOpenFailed(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }
}

impl ProcessInfo for ProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.snapshot()
    }

    fn is_alive(&self) -> bool {
        ProcessHandle::is_alive(self)
    }

    fn module_base(&self, name: &str) -> Option<u64> {
        self.modules.base_of(name, || self.enumerate_modules())
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle came from OpenProcess and has not been closed yet.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

/// Provider backed by the operating system's process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProvider;

impl SystemProcessProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProvider for SystemProcessProvider {
    type Process = ProcessHandle;

    fn find_process_id(&self, name: &str) -> Option<u32> {
        match find_process_id(name) {
            Ok(pid) => pid,
            Err(e) => {
                debug!("Process lookup failed: {}", e);
                None
            }
        }
    }

    fn open_process(&self, pid: u32) -> Result<Self::Process> {
        ProcessHandle::open(pid)
    }
}

#[cfg(target_os = "windows")]
fn find_process_id(name: &str) -> Result<Option<u32>> {
    // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to call.
    // The returned handle is closed at the end of this function.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessNotFound(e.to_string()))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;

    // SAFETY: Process32FirstW and Process32NextW are called with a valid snapshot handle
    // and a properly sized PROCESSENTRY32W. szExeFile is null-terminated by the API.
    unsafe {
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let exe_name = OsString::from_wide(
                    &entry.szExeFile[..entry
                        .szExeFile
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szExeFile.len())],
                );

                if process_name_matches(&exe_name.to_string_lossy(), name) {
                    found = Some(entry.th32ProcessID);
                    break;
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
    }

    // SAFETY: snapshot is a valid handle from CreateToolhelp32Snapshot
    let _ = unsafe { CloseHandle(snapshot) };
    Ok(found)
}

#[cfg(not(target_os = "windows"))]
fn find_process_id(_name: &str) -> Result<Option<u32>> {
    Ok(None)
}

#[cfg(target_os = "windows")]
fn enumerate_modules(handle: HANDLE) -> Result<Vec<ModuleInfo>> {
    let mut handles = vec![HMODULE::default(); MAX_MODULES];
    let mut needed: u32 = 0;

    // SAFETY: EnumProcessModulesEx is called with a valid process handle and a buffer
    // whose byte size is passed alongside it. `needed` receives the bytes required.
    unsafe {
        EnumProcessModulesEx(
            handle,
            handles.as_mut_ptr(),
            (handles.len() * std::mem::size_of::<HMODULE>()) as u32,
            &mut needed,
            LIST_MODULES_ALL,
        )
        .map_err(|e| Error::ProcessOpenFailed(format!("Failed to enumerate modules: {}", e)))?;
    }

    let count = (needed as usize / std::mem::size_of::<HMODULE>()).min(MAX_MODULES);
    if count == 0 {
        return Err(Error::ProcessOpenFailed(
            "No modules found in process".to_string(),
        ));
    }
    handles.truncate(count);

    let mut modules = Vec::with_capacity(count);
    for module in handles {
        let mut name_buf = [0u16; 260];
        // SAFETY: GetModuleBaseNameW writes at most name_buf.len() UTF-16 units and
        // returns the number written; module comes from the enumeration above.
        let len = unsafe { GetModuleBaseNameW(handle, module, &mut name_buf) } as usize;
        if len == 0 {
            continue;
        }

        let mut info = MODULEINFO::default();
        // SAFETY: GetModuleInformation is called with a valid process handle, a module
        // handle from the enumeration, and a correctly sized MODULEINFO.
        let info_result = unsafe {
            GetModuleInformation(
                handle,
                module,
                &mut info,
                std::mem::size_of::<MODULEINFO>() as u32,
            )
        };
        if let Err(e) = info_result {
            debug!("Skipping module without information: {}", e);
            continue;
        }

        modules.push(ModuleInfo::new(
            OsString::from_wide(&name_buf[..len]).to_string_lossy(),
            info.lpBaseOfDll as u64,
        ));
    }

    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_system_provider_finds_nothing_off_windows() {
        let provider = SystemProcessProvider::new();
        assert_eq!(provider.find_process_id("Bug Fables"), None);
        assert!(provider.open_process(1).is_err());
    }

    #[test]
    fn test_system_provider_ignores_missing_process() {
        let provider = SystemProcessProvider::new();
        assert_eq!(
            provider.find_process_id("definitely-not-a-running-process-name"),
            None
        );
    }
}
