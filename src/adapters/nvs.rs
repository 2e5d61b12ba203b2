//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the motor node.  The motion config is
//! one postcard blob under a single key, rewritten in full on every
//! accepted config command and read back once at boot.
//!
//! ESP-IDF NVS commits are atomic, so a power loss mid-save leaves the
//! previous record intact.  The simulation backend is an in-memory cell
//! for host tests.

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::MotionConfig;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "coopdoor";
const CONFIG_KEY: &str = "motioncfg";

/// Upper bound for the serialized config blob.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsConfigStore {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsConfigStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after a partition-version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsConfigStore: ESP-IDF NVS initialised");
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsConfigStore: simulation backend");
            Ok(Self {
                blob: std::cell::RefCell::new(None),
            })
        }
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = CONFIG_NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let mut key_buf = [0u8; 16];
        let key_bytes = CONFIG_KEY.as_bytes();
        key_buf[..key_bytes.len()].copy_from_slice(key_bytes);

        Self::with_nvs_handle(false, |handle| {
            let mut buf = vec![0u8; MAX_BLOB_SIZE];
            let mut len = buf.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr().cast(),
                    &mut len,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(len);
            Ok(buf)
        })
        .map_err(|rc| {
            if rc == ESP_ERR_NVS_NOT_FOUND {
                ConfigError::NotFound
            } else {
                ConfigError::IoError
            }
        })
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, data: &[u8]) -> Result<(), ConfigError> {
        let mut key_buf = [0u8; 16];
        let key_bytes = CONFIG_KEY.as_bytes();
        key_buf[..key_bytes.len()].copy_from_slice(key_bytes);

        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr().cast(),
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|rc| {
            if rc == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                ConfigError::StorageFull
            } else {
                ConfigError::IoError
            }
        })
    }
}

impl ConfigPort for NvsConfigStore {
    fn load(&self) -> Result<MotionConfig, ConfigError> {
        #[cfg(target_os = "espidf")]
        let blob = self.read_blob()?;

        #[cfg(not(target_os = "espidf"))]
        let blob = self.blob.borrow().clone().ok_or(ConfigError::NotFound)?;

        postcard::from_bytes(&blob).map_err(|_| ConfigError::Corrupted)
    }

    fn save(&self, config: &MotionConfig) -> Result<(), ConfigError> {
        let blob = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if blob.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }

        #[cfg(target_os = "espidf")]
        return self.write_blob(&blob);

        #[cfg(not(target_os = "espidf"))]
        {
            *self.blob.borrow_mut() = Some(blob);
            Ok(())
        }
    }
}
