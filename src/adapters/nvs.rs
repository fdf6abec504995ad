//! NVS (Non-Volatile Storage) adapter implementing [`ConfigPort`].
//!
//! The whole [`SystemConfig`] is one `postcard` blob under
//! `agronode::syscfg`.  Saving validates first; loading falls back to the
//! defaults when the blob is absent, undecodable or out of range, so a bad
//! flash image can never keep the controller from booting.
//!
//! The host backend keeps the blob in memory.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &[u8] = b"agronode\0";
const CONFIG_KEY: &[u8] = b"syscfg\0";

/// Upper bound accepted for the stored blob.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsConfigStore {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

/// Decode a stored blob; anything unusable yields the defaults.
fn decode_or_default(bytes: &[u8]) -> SystemConfig {
    let cfg: SystemConfig = match postcard::from_bytes(bytes) {
        Ok(cfg) => cfg,
        Err(_) => {
            warn!("NvsConfigStore: stored config corrupted, using defaults");
            return SystemConfig::default();
        }
    };
    if let Err(e) = cfg.validate() {
        warn!("NvsConfigStore: stored config rejected ({e}), using defaults");
        return SystemConfig::default();
    }
    info!("NvsConfigStore: loaded config ({} bytes)", bytes.len());
    cfg
}

impl NvsConfigStore {
    /// Initialise NVS flash.  A full or outdated partition is erased and
    /// re-initialised.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        // SAFETY: called from the main task before any other NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK as i32 || unsafe { nvs_flash_init() } != ESP_OK as i32 {
                return Err(ConfigError::IoError);
            }
        } else if ret != ESP_OK as i32 {
            return Err(ConfigError::IoError);
        }
        info!("NvsConfigStore: ESP-IDF NVS initialised");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsConfigStore: simulation backend");
        Ok(Self {
            blob: std::cell::RefCell::new(None),
        })
    }

    /// Overwrite the raw blob (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn put_raw(&self, bytes: &[u8]) {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
    ) -> Result<T, i32> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        // SAFETY: namespace is null-terminated; handle is closed below.
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob() -> Result<Vec<u8>, i32> {
        Self::with_nvs_handle(false, |handle| {
            let key = CONFIG_KEY.as_ptr() as *const _;
            let mut size: usize = 0;
            // SAFETY: size query with a null buffer.
            let ret = unsafe { nvs_get_blob(handle, key, core::ptr::null_mut(), &mut size) };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH as i32);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: buf holds `size` bytes.
            let ret = unsafe { nvs_get_blob(handle, key, buf.as_mut_ptr() as *mut _, &mut size) };
            if ret != ESP_OK as i32 {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        })
    }
}

impl ConfigPort for NvsConfigStore {
    #[cfg(target_os = "espidf")]
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match Self::read_blob() {
            Ok(bytes) => Ok(decode_or_default(&bytes)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => {
                info!("NvsConfigStore: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("NvsConfigStore: NVS read error {e}, using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.blob.borrow().as_deref() {
            Some(bytes) if bytes.len() <= MAX_BLOB_SIZE => Ok(decode_or_default(bytes)),
            Some(_) => {
                warn!("NvsConfigStore: stored blob too large, using defaults");
                Ok(SystemConfig::default())
            }
            None => {
                info!("NvsConfigStore: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            *self.blob.borrow_mut() = Some(bytes);
            info!("NvsConfigStore: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                // SAFETY: key is null-terminated; bytes outlive the call.
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        CONFIG_KEY.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(())
            });
            result
                .map(|()| info!("NvsConfigStore: config saved to NVS ({} bytes)", bytes.len()))
                .map_err(|e| {
                    warn!("NvsConfigStore: NVS write error {e}");
                    ConfigError::IoError
                })
        }
    }
}
