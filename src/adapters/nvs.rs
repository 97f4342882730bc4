//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over one NVS namespace.  Strings map to
//! `nvs_{get,set}_str`, booleans to `nvs_{get,set}_u8`.
//!
//! - **`target_os = "espidf"`**: raw ESP-IDF NVS calls, committed per write.
//! - **all other targets**: in-memory maps, with a write-failure toggle for
//!   exercising error paths.

use crate::app::ports::{StorageError, StoragePort};
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;
#[cfg(target_os = "espidf")]
use std::ffi::CString;

/// Namespace holding every device setting.
pub const CONFIG_NAMESPACE: &str = "config";

pub struct NvsAdapter {
    namespace: &'static str,
    #[cfg(not(target_os = "espidf"))]
    strings: HashMap<String, String>,
    #[cfg(not(target_os = "espidf"))]
    bools: HashMap<String, bool>,
    #[cfg(not(target_os = "espidf"))]
    fail_writes: bool,
}

impl NvsAdapter {
    /// Initialise NVS flash (erasing it on layout/version mismatch) and bind
    /// to `namespace`.
    pub fn new(namespace: &'static str) -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the main task before any other NVS user.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                esp!(unsafe { nvs_flash_erase() }).map_err(|_| StorageError::IoError)?;
                esp!(unsafe { nvs_flash_init() }).map_err(|_| StorageError::IoError)?;
            } else {
                esp!(ret).map_err(|_| StorageError::IoError)?;
            }
            info!("NvsAdapter: ESP-IDF NVS initialised (namespace '{}')", namespace);
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend (namespace '{}')", namespace);

        Ok(Self {
            namespace,
            #[cfg(not(target_os = "espidf"))]
            strings: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            bools: HashMap::new(),
            #[cfg(not(target_os = "espidf"))]
            fail_writes: false,
        })
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Make every subsequent write fail with `IoError`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    #[cfg(not(target_os = "espidf"))]
    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        Ok(())
    }

    /// Open the namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(&self, write: bool, f: F) -> Result<T, EspError>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, EspError>,
    {
        // NVS namespaces are at most 15 bytes; the zeroed tail terminates.
        let mut ns = [0u8; 16];
        let len = self.namespace.len().min(15);
        ns[..len].copy_from_slice(&self.namespace.as_bytes()[..len]);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        // SAFETY: `ns` is NUL-terminated and outlives the call.
        esp!(unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) })?;
        let result = f(handle);
        // SAFETY: handle was opened above and is not used after this point.
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn key(key: &str) -> Result<CString, StorageError> {
        CString::new(key).map_err(|_| StorageError::InvalidValue)
    }

    #[cfg(target_os = "espidf")]
    fn is_not_found(e: &EspError) -> bool {
        e.code() == ESP_ERR_NVS_NOT_FOUND as esp_err_t
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsAdapter {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.strings.get(key).cloned())
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        if value.contains('\0') {
            return Err(StorageError::InvalidValue);
        }
        self.strings.insert(key.into(), value.into());
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        Ok(self.bools.get(key).copied())
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.check_writable()?;
        self.bools.insert(key.into(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.check_writable()?;
        self.strings.clear();
        self.bools.clear();
        info!("NvsAdapter: namespace '{}' cleared (simulation)", self.namespace);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for NvsAdapter {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = Self::key(key)?;
        let result = self.with_nvs_handle(false, |handle| {
            let mut len: usize = 0;
            // SAFETY: a null out-buffer asks NVS for the stored length.
            esp!(unsafe { nvs_get_str(handle, key.as_ptr(), core::ptr::null_mut(), &mut len) })?;
            let mut buf = vec![0u8; len];
            // SAFETY: `buf` holds exactly `len` bytes as reported above.
            esp!(unsafe { nvs_get_str(handle, key.as_ptr(), buf.as_mut_ptr().cast(), &mut len) })?;
            Ok(buf)
        });

        match result {
            Ok(mut bytes) => {
                if bytes.last() == Some(&0) {
                    bytes.pop();
                }
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|_| StorageError::InvalidValue)
            }
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: get_str failed: {e}");
                Err(StorageError::IoError)
            }
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = Self::key(key)?;
        let value = CString::new(value).map_err(|_| StorageError::InvalidValue)?;
        self.with_nvs_handle(true, |handle| {
            // SAFETY: both pointers are NUL-terminated CStrings alive for the call.
            esp!(unsafe { nvs_set_str(handle, key.as_ptr(), value.as_ptr()) })?;
            esp!(unsafe { nvs_commit(handle) })
        })
        .map_err(|e| {
            warn!("NvsAdapter: set_str failed: {e}");
            StorageError::IoError
        })
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        let key = Self::key(key)?;
        let result = self.with_nvs_handle(false, |handle| {
            let mut raw: u8 = 0;
            // SAFETY: `raw` is a valid out-pointer for one byte.
            esp!(unsafe { nvs_get_u8(handle, key.as_ptr(), &mut raw) })?;
            Ok(raw)
        });
        match result {
            Ok(raw) => Ok(Some(raw != 0)),
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: get_bool failed: {e}");
                Err(StorageError::IoError)
            }
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        let key = Self::key(key)?;
        self.with_nvs_handle(true, |handle| {
            // SAFETY: key is a NUL-terminated CString alive for the call.
            esp!(unsafe { nvs_set_u8(handle, key.as_ptr(), u8::from(value)) })?;
            esp!(unsafe { nvs_commit(handle) })
        })
        .map_err(|e| {
            warn!("NvsAdapter: set_bool failed: {e}");
            StorageError::IoError
        })
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.with_nvs_handle(true, |handle| {
            // SAFETY: handle is open read-write.
            esp!(unsafe { nvs_erase_all(handle) })?;
            esp!(unsafe { nvs_commit(handle) })
        })
        .map_err(|e| {
            warn!("NvsAdapter: clear failed: {e}");
            StorageError::IoError
        })?;
        info!("NvsAdapter: namespace '{}' erased", self.namespace);
        Ok(())
    }
}
