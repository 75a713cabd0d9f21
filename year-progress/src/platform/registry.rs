//! Windows Registry shared preferences
//!
//! Mirrors a preference namespace into
//! `HKEY_CURRENT_USER\Software\YearProgress\<namespace>` as REG_SZ values,
//! where a wallpaper renderer on Windows can read them without access to
//! the app's own storage.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::iter;
use std::os::windows::ffi::OsStrExt;

use async_trait::async_trait;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_PATH_NOT_FOUND,
    ERROR_SUCCESS,
};
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteTreeW, RegEnumValueW, RegOpenKeyExW, RegQueryValueExW,
    RegSetValueExW, HKEY, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_OPTION_NON_VOLATILE,
    REG_SAM_FLAGS, REG_SZ, REG_VALUE_TYPE,
};

use crate::config::REGISTRY_ROOT_KEY;
use crate::error::{AppError, Result};
use crate::storage::SharedPreferences;

/// Longest value name the registry allows, in UTF-16 units
const MAX_VALUE_NAME_LEN: usize = 16_383;

/// Convert a Rust string to a null-terminated UTF-16 wide string for Win32 APIs
fn to_wide(input: &str) -> Vec<u16> {
    OsStr::new(input)
        .encode_wide()
        .chain(iter::once(0))
        .collect()
}

/// Decode a UTF-16 buffer, stopping at the first null
fn from_wide(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}

/// Safe wrapper around the Windows Registry operations used for mirroring
pub struct WindowsRegistry;

impl WindowsRegistry {
    /// Open `key_path` under HKEY_CURRENT_USER, `Ok(None)` if it does not exist
    fn open(
        key_path: &str,
        access: REG_SAM_FLAGS,
    ) -> std::result::Result<Option<HKEY>, String> {
        let key_path_wide = to_wide(key_path);
        let mut key_handle: HKEY = HKEY::default();

        // SAFETY:
        // - key_path_wide is a valid null-terminated UTF-16 buffer that outlives this call
        // - key_handle is a valid pointer to receive the opened key
        let open_result = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_path_wide.as_ptr()),
                0,
                access,
                &mut key_handle,
            )
        };

        if open_result == ERROR_SUCCESS {
            Ok(Some(key_handle))
        } else if open_result == ERROR_FILE_NOT_FOUND || open_result == ERROR_PATH_NOT_FOUND {
            Ok(None)
        } else {
            Err(format!(
                "Failed to open registry key {}: error code {}",
                key_path, open_result.0
            ))
        }
    }

    /// Create `key_path` (and missing parents) under HKEY_CURRENT_USER for writing
    fn create(key_path: &str) -> std::result::Result<HKEY, String> {
        let key_path_wide = to_wide(key_path);
        let mut key_handle: HKEY = HKEY::default();

        // SAFETY:
        // - key_path_wide is a valid null-terminated UTF-16 buffer
        // - key_handle receives the created or opened key
        // - No class, security attributes or disposition are requested
        let create_result = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_path_wide.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut key_handle,
                None,
            )
        };

        if create_result == ERROR_SUCCESS {
            Ok(key_handle)
        } else {
            Err(format!(
                "Failed to create registry key {}: error code {}",
                key_path, create_result.0
            ))
        }
    }

    fn close(key_handle: HKEY) {
        // SAFETY: key_handle was opened successfully and must be closed
        let _ = unsafe { RegCloseKey(key_handle) };
    }

    /// Write REG_SZ values, creating the key if needed.
    ///
    /// Values are written one at a time; a reader may observe some new and
    /// some old values until the loop completes.
    pub fn write_strings(
        key_path: &str,
        values: &[(&str, String)],
    ) -> std::result::Result<(), String> {
        let key_handle = Self::create(key_path)?;

        let mut outcome = Ok(());
        for (value_name, value) in values {
            let value_name_wide = to_wide(value_name);
            let value_wide = to_wide(value);

            // SAFETY: value_wide is a live Vec<u16>; viewing it as bytes covers
            // exactly its allocation (2 bytes per UTF-16 unit, including the null)
            let data_bytes: &[u8] = unsafe {
                std::slice::from_raw_parts(value_wide.as_ptr() as *const u8, value_wide.len() * 2)
            };

            // SAFETY:
            // - key_handle is valid from successful RegCreateKeyExW
            // - value_name_wide is a valid null-terminated UTF-16 buffer
            // - data_bytes is valid for the specified length
            let set_result = unsafe {
                RegSetValueExW(
                    key_handle,
                    PCWSTR::from_raw(value_name_wide.as_ptr()),
                    0,
                    REG_SZ,
                    Some(data_bytes),
                )
            };

            if set_result != ERROR_SUCCESS {
                outcome = Err(format!(
                    "Failed to set registry value {}: error code {}",
                    value_name, set_result.0
                ));
                break;
            }
        }

        Self::close(key_handle);
        outcome
    }

    /// Read a REG_SZ value, `Ok(None)` if the key or value is missing
    pub fn read_string(
        key_path: &str,
        value_name: &str,
    ) -> std::result::Result<Option<String>, String> {
        let Some(key_handle) = Self::open(key_path, KEY_READ)? else {
            return Ok(None);
        };
        let outcome = Self::query_string(key_handle, value_name);
        Self::close(key_handle);
        outcome
    }

    fn query_string(
        key_handle: HKEY,
        value_name: &str,
    ) -> std::result::Result<Option<String>, String> {
        let value_name_wide = to_wide(value_name);
        let mut value_type = REG_VALUE_TYPE::default();
        let mut data_len: u32 = 0;

        // Query the size first (null data buffer)
        // SAFETY:
        // - key_handle is valid
        // - value_name_wide is a valid null-terminated UTF-16 buffer
        // - value_type and data_len are valid out pointers
        let size_result = unsafe {
            RegQueryValueExW(
                key_handle,
                PCWSTR::from_raw(value_name_wide.as_ptr()),
                None,
                Some(&mut value_type as *mut _),
                None,
                Some(&mut data_len as *mut _),
            )
        };

        if size_result == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if size_result != ERROR_SUCCESS && size_result != ERROR_MORE_DATA {
            return Err(format!(
                "Failed to query registry value {}: error code {}",
                value_name, size_result.0
            ));
        }
        if value_type != REG_SZ {
            return Err(format!("Registry value {} is not a string", value_name));
        }

        let mut buffer = vec![0u16; (data_len as usize).div_ceil(2) + 1];
        let mut buffer_len = (buffer.len() * 2) as u32;

        // SAFETY:
        // - buffer is writable for buffer_len bytes
        // - buffer_len reports that size and receives the bytes written
        let read_result = unsafe {
            RegQueryValueExW(
                key_handle,
                PCWSTR::from_raw(value_name_wide.as_ptr()),
                None,
                None,
                Some(buffer.as_mut_ptr() as *mut u8),
                Some(&mut buffer_len as *mut _),
            )
        };

        if read_result != ERROR_SUCCESS {
            return Err(format!(
                "Failed to read registry value {}: error code {}",
                value_name, read_result.0
            ));
        }

        Ok(Some(from_wide(&buffer)))
    }

    /// All REG_SZ values under `key_path`; an absent key has none
    pub fn read_all_strings(
        key_path: &str,
    ) -> std::result::Result<BTreeMap<String, String>, String> {
        let Some(key_handle) = Self::open(key_path, KEY_READ)? else {
            return Ok(BTreeMap::new());
        };

        let mut names = Vec::new();
        let mut index = 0u32;
        let outcome = loop {
            let mut name_buffer = vec![0u16; MAX_VALUE_NAME_LEN + 1];
            let mut name_len = name_buffer.len() as u32;

            // SAFETY:
            // - name_buffer is writable for name_len UTF-16 units
            // - type and data are not requested
            let enum_result = unsafe {
                RegEnumValueW(
                    key_handle,
                    index,
                    PWSTR::from_raw(name_buffer.as_mut_ptr()),
                    &mut name_len,
                    None,
                    None,
                    None,
                    None,
                )
            };

            if enum_result == ERROR_NO_MORE_ITEMS {
                break Ok(());
            }
            if enum_result != ERROR_SUCCESS {
                break Err(format!(
                    "Failed to enumerate registry values: error code {}",
                    enum_result.0
                ));
            }

            names.push(String::from_utf16_lossy(&name_buffer[..name_len as usize]));
            index += 1;
        };

        let mut values = BTreeMap::new();
        let outcome = outcome.and_then(|()| {
            for name in names {
                // Non-string values written by other tools are skipped
                if let Ok(Some(value)) = Self::query_string(key_handle, &name) {
                    values.insert(name, value);
                }
            }
            Ok(())
        });

        Self::close(key_handle);
        outcome.map(|()| values)
    }

    /// Delete a key and everything below it; a missing key succeeds
    pub fn delete_tree(key_path: &str) -> std::result::Result<(), String> {
        let key_path_wide = to_wide(key_path);

        // SAFETY: key_path_wide is a valid null-terminated UTF-16 buffer
        let result =
            unsafe { RegDeleteTreeW(HKEY_CURRENT_USER, PCWSTR::from_raw(key_path_wide.as_ptr())) };

        if result == ERROR_SUCCESS
            || result == ERROR_FILE_NOT_FOUND
            || result == ERROR_PATH_NOT_FOUND
        {
            Ok(())
        } else {
            Err(format!(
                "Failed to delete registry key {}: error code {}",
                key_path, result.0
            ))
        }
    }
}

/// Shared preferences namespace backed by a registry key
pub struct RegistrySharedPreferences {
    namespace: String,
    key_path: String,
}

impl RegistrySharedPreferences {
    pub fn new(namespace: &str) -> Self {
        Self::with_root(REGISTRY_ROOT_KEY, namespace)
    }

    /// Namespace under a custom root key, relative to HKEY_CURRENT_USER
    pub fn with_root(root: &str, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            key_path: format!("{}\\{}", root, namespace),
        }
    }

    pub fn key_path(&self) -> &str {
        &self.key_path
    }
}

#[async_trait]
impl SharedPreferences for RegistrySharedPreferences {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>> {
        WindowsRegistry::read_all_strings(&self.key_path).map_err(AppError::Registry)
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        WindowsRegistry::read_string(&self.key_path, key).map_err(AppError::Registry)
    }

    async fn put_strings(&self, entries: &[(&str, String)]) -> Result<()> {
        WindowsRegistry::write_strings(&self.key_path, entries).map_err(AppError::Registry)?;
        tracing::debug!(
            "Wrote {} registry value(s) under HKCU\\{}",
            entries.len(),
            self.key_path
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        WindowsRegistry::delete_tree(&self.key_path).map_err(AppError::Registry)
    }
}
