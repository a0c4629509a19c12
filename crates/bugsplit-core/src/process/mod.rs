mod handle;
pub mod provider;
mod reader;

// Mock process table and memory for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::{ProcessHandle, SystemProcessProvider};
pub use provider::{ModuleInfo, ProcessInfo, ProcessProvider, process_name_matches};
pub use reader::{POINTER_SIZE, ReadMemory};

#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder, MockProcess, MockProcessProvider};
