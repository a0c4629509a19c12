#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

use crate::error::{Error, Result};
use crate::process::ProcessHandle;

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

/// Size of a pointer in the target process (both supported builds are 64-bit)
pub const POINTER_SIZE: usize = 8;

/// Strings are read in aligned chunks of this size so a short string near the
/// end of a mapped region never requests bytes past it
const STRING_CHUNK: usize = 16;

/// Trait for reading memory from a process or buffer
///
/// This trait enables mocking for tests and abstracts over different memory sources.
pub trait ReadMemory {
    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Read a signed 32-bit integer from memory
    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a signed 64-bit integer from memory
    fn read_i64(&self, address: u64) -> Result<i64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read an unsigned 64-bit integer from memory
    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a pointer-sized value from memory
    fn read_pointer(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, POINTER_SIZE)?;
        let raw: [u8; POINTER_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::MemoryReadFailed {
                address,
                message: format!("Short pointer read ({} bytes)", b.len()),
            }
        })?;
        Ok(u64::from_le_bytes(raw))
    }

    /// Read a null-terminated byte string of at most `max_len` bytes
    ///
    /// The returned bytes exclude the terminator. If no terminator is found
    /// within `max_len` bytes, all of them are returned. Reading stops at the
    /// chunk holding the terminator, so bytes past it need not be mapped.
    fn read_c_string(&self, address: u64, max_len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(max_len.min(STRING_CHUNK * 4));
        let mut cursor = address;

        while bytes.len() < max_len {
            let to_boundary = STRING_CHUNK - (cursor % STRING_CHUNK as u64) as usize;
            let len = to_boundary.min(max_len - bytes.len());
            let chunk = self.read_bytes(cursor, len)?;

            if let Some(end) = chunk.iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..end]);
                return Ok(bytes);
            }
            bytes.extend_from_slice(&chunk);
            cursor = cursor.wrapping_add(len as u64);
        }
        Ok(bytes)
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    fn read_bytes_impl(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with:
        // - A valid process handle (obtained via OpenProcess with PROCESS_VM_READ)
        // - An address in the target process's address space; an unmapped address
        //   makes the call fail rather than fault
        // - A buffer of exactly `size` bytes owned by this function
        unsafe {
            ReadProcessMemory(
                self.handle(),
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        }

        // All-or-nothing: a partial copy means the range crossed into unmapped memory.
        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("Expected {} bytes, read {}", size, bytes_read),
            });
        }

        Ok(buffer)
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    fn read_bytes_impl(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address,
            message: "Windows only: memory reading not supported on this platform".to_string(),
        })
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.read_bytes_impl(address, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemoryBuilder;

    #[test]
    fn test_read_i32() {
        let memory = MockMemoryBuilder::new()
            .write_bytes(0x1000, &[0x78, 0x56, 0x34, 0x12])
            .build();

        assert_eq!(memory.read_i32(0x1000).unwrap(), 0x12345678);
    }

    #[test]
    fn test_read_i32_negative() {
        let memory = MockMemoryBuilder::new()
            .write_bytes(0x1000, &[0xFF, 0xFF, 0xFF, 0xFF])
            .build();

        assert_eq!(memory.read_i32(0x1000).unwrap(), -1);
    }

    #[test]
    fn test_read_i64() {
        let memory = MockMemoryBuilder::new()
            .write_bytes(0x1000, &[0xEF, 0xCD, 0xAB, 0x90, 0x78, 0x56, 0x34, 0x12])
            .build();

        assert_eq!(memory.read_i64(0x1000).unwrap(), 0x1234567890ABCDEF_i64);
    }

    #[test]
    fn test_read_pointer() {
        let memory = MockMemoryBuilder::new()
            .write_pointer(0x1000, 0x7FF6_1234_5678)
            .build();

        assert_eq!(memory.read_pointer(0x1000).unwrap(), 0x7FF6_1234_5678);
    }

    #[test]
    fn test_read_c_string() {
        let memory = MockMemoryBuilder::new()
            .write_bytes(0x1000, b"42\0garbage")
            .build();

        assert_eq!(memory.read_c_string(0x1000, 10).unwrap(), b"42".to_vec());
    }

    #[test]
    fn test_read_c_string_without_terminator() {
        let memory = MockMemoryBuilder::new().write_bytes(0x1000, b"1234").build();

        assert_eq!(memory.read_c_string(0x1000, 4).unwrap(), b"1234".to_vec());
    }

    #[test]
    fn test_read_c_string_stops_before_unmapped_memory() {
        let memory = MockMemoryBuilder::new().write_bytes(0x1FFD, b"12\0").build();

        assert_eq!(memory.read_c_string(0x1FFD, 64).unwrap(), b"12".to_vec());
    }

    #[test]
    fn test_read_c_string_spanning_chunks() {
        let memory = MockMemoryBuilder::new()
            .write_c_string(0x100A, "0123456789abcdefXYZ", 22)
            .build();

        assert_eq!(
            memory.read_c_string(0x100A, 64).unwrap(),
            b"0123456789abcdefXYZ".to_vec()
        );
    }

    #[test]
    fn test_read_c_string_unterminated_into_unmapped_memory() {
        let memory = MockMemoryBuilder::new().write_bytes(0x1FFC, b"1234").build();

        assert!(memory.read_c_string(0x1FFC, 64).is_err());
    }

    #[test]
    fn test_read_pointer_partially_mapped() {
        let memory = MockMemoryBuilder::new().write_bytes(0x1000, &[0x01; 4]).build();

        assert!(memory.read_pointer(0x1000).is_err());
    }

    #[test]
    fn test_read_out_of_bounds() {
        let memory = MockMemoryBuilder::new().write_bytes(0x1000, &[0x01, 0x02]).build();

        assert!(memory.read_i32(0x1000).is_err());
    }
}
