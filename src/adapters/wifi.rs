//! WiFi station-mode adapter.
//!
//! Credentials are baked in at build time (`AGRONODE_WIFI_SSID`,
//! `AGRONODE_WIFI_PASS`).  Boot makes one bounded connection attempt and
//! carries on offline if it fails; the telemetry controller simply sees the
//! link as down and skips its cycles.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi`, link
//!   state from `esp_wifi_sta_get_ap_info`.
//! - **all other targets**: a simulated link flag.

use core::fmt;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

/// Bounded wait for association at boot.
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && !(8..=64).contains(&password.len()) {
            return Err(ConnectivityError::InvalidPassword);
        }
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        match option_env!("AGRONODE_WIFI_SSID") {
            Some(ssid) if !ssid.is_empty() => {
                Self::new(ssid, option_env!("AGRONODE_WIFI_PASS").unwrap_or(""))
            }
            _ => Err(ConnectivityError::NoCredentials),
        }
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Join the configured access point.  The returned driver must stay alive
/// for the link to persist.
#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: esp_idf_hal::modem::Modem,
    sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
    creds: &WifiCredentials,
) -> Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>, ConnectivityError>
{
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    let driver = EspWifi::new(modem, sysloop.clone(), Some(nvs))
        .map_err(|_| ConnectivityError::ConnectionFailed)?;
    let mut wifi =
        BlockingWifi::wrap(driver, sysloop).map_err(|_| ConnectivityError::ConnectionFailed)?;

    let client = ClientConfiguration {
        ssid: creds.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
        password: creds
            .password
            .as_str()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidPassword)?,
        auth_method: if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    };
    wifi.set_configuration(&Configuration::Client(client))
        .map_err(|_| ConnectivityError::ConnectionFailed)?;
    wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;

    info!("WiFi: connecting to '{}'", creds.ssid);
    let deadline = std::time::Instant::now()
        + std::time::Duration::from_millis(u64::from(CONNECT_TIMEOUT_MS));
    loop {
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => break,
            Err(e) if std::time::Instant::now() < deadline => {
                warn!("WiFi: connect attempt failed ({e}), retrying");
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
            Err(_) => return Err(ConnectivityError::ConnectionFailed),
        }
    }
    info!("WiFi: connected (RSSI={:?})", rssi());
    Ok(wifi)
}

#[cfg(target_os = "espidf")]
fn ap_info() -> Option<esp_idf_svc::sys::wifi_ap_record_t> {
    let mut info: esp_idf_svc::sys::wifi_ap_record_t = Default::default();
    // SAFETY: plain query into a caller-owned record.
    let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut info) };
    (ret == esp_idf_svc::sys::ESP_OK as i32).then_some(info)
}

/// Station currently associated.
#[cfg(target_os = "espidf")]
pub fn link_up() -> bool {
    ap_info().is_some()
}

#[cfg(target_os = "espidf")]
pub fn rssi() -> Option<i8> {
    ap_info().map(|i| i.rssi)
}

#[cfg(not(target_os = "espidf"))]
static SIM_LINK: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(true);

#[cfg(not(target_os = "espidf"))]
pub fn link_up() -> bool {
    SIM_LINK.load(core::sync::atomic::Ordering::Relaxed)
}

#[cfg(not(target_os = "espidf"))]
pub fn rssi() -> Option<i8> {
    link_up().then_some(-60)
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_link(up: bool) {
    info!("WiFi(sim): link {}", if up { "up" } else { "down" });
    SIM_LINK.store(up, core::sync::atomic::Ordering::Relaxed);
}
