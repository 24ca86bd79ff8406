//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over the ESP-IDF NVS string API.  Every call
//! opens the namespace, performs one access and closes it again; reads open
//! the namespace read-only, so reading a namespace that was never written
//! reports [`StorageError::NotFound`].
//!
//! On the host a `HashMap` stands in for flash with the same namespace and
//! key rules.

use crate::app::ports::{StorageError, StoragePort};
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS limits namespace and key names to 15 bytes plus NUL.
const MAX_NAME_LEN: usize = 15;

/// Largest string value read back (NVS allows up to 4000 bytes).
#[cfg(target_os = "espidf")]
const MAX_VALUE_LEN: usize = 4000;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, String>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of a namespace or key name.
    fn c_name(name: &str) -> Result<[u8; MAX_NAME_LEN + 1], StorageError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
            return Err(StorageError::InvalidValue);
        }
        let mut buf = [0u8; MAX_NAME_LEN + 1];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(buf)
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, StorageError>,
    {
        let ns = Self::c_name(namespace)?;
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(map_esp_err(ret));
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

#[cfg(target_os = "espidf")]
fn map_esp_err(code: esp_err_t) -> StorageError {
    match code {
        ESP_ERR_NVS_NOT_FOUND => StorageError::NotFound,
        ESP_ERR_NVS_NOT_ENOUGH_SPACE | ESP_ERR_NVS_NO_FREE_PAGES => StorageError::Full,
        ESP_ERR_NVS_INVALID_NAME | ESP_ERR_NVS_INVALID_LENGTH => StorageError::InvalidValue,
        _ => StorageError::IoError,
    }
}

impl StoragePort for NvsAdapter {
    fn get_str(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            Self::c_name(namespace)?;
            Self::c_name(key)?;
            let prefix = format!("{}::", namespace);
            if !self.store.keys().any(|k| k.starts_with(&prefix)) {
                return Err(StorageError::NotFound);
            }
            Ok(self
                .store
                .get(&Self::composite_key(namespace, key))
                .cloned())
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::c_name(key)?;
            Self::with_nvs_handle(namespace, false, |handle| {
                // First call: get size (including NUL)
                let mut size: usize = 0;
                let ret = unsafe {
                    nvs_get_str(
                        handle,
                        key_buf.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Ok(None);
                }
                if ret != ESP_OK || size == 0 || size > MAX_VALUE_LEN {
                    return Err(map_esp_err(ret));
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_str(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(map_esp_err(ret));
                }
                buf.truncate(size.saturating_sub(1));
                String::from_utf8(buf)
                    .map(Some)
                    .map_err(|_| StorageError::InvalidValue)
            })
        }
    }

    fn set_str(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            Self::c_name(namespace)?;
            Self::c_name(key)?;
            if value.contains('\0') {
                return Err(StorageError::InvalidValue);
            }
            self.store
                .insert(Self::composite_key(namespace, key), value.to_string());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key_buf = Self::c_name(key)?;
            let value = std::ffi::CString::new(value).map_err(|_| StorageError::InvalidValue)?;
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_set_str(handle, key_buf.as_ptr() as *const _, value.as_ptr()) };
                if ret != ESP_OK {
                    warn!("NvsAdapter: NVS write error {}", ret);
                    return Err(map_esp_err(ret));
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(map_esp_err(ret));
                }
                Ok(())
            })
        }
    }
}
