//! Telemetry admission and retry accounting.
//!
//! ```text
//!   link down ─────────────────────────────▶ skip (no state change)
//!   now − last_send < min_interval ────────▶ skip (no state change)
//!   no endpoint ───────────────────────────▶ success, last_send = now
//!   POST → 200 ────────────────────────────▶ failures = 0, last_send = now
//!   POST → other / transport error ────────▶ failures += 1 (saturating), last_send = now
//! ```
//!
//! The failure counter is diagnostic; nothing backs off on it.

use log::{info, warn};

use crate::app::ports::TelemetryTransport;
use crate::app::status::telemetry_payload;
use crate::config::{SystemConfig, TelemetryEndpoint};
use crate::state::StateStore;

/// Path appended to the collector base URL.
pub const TELEMETRY_PATH: &str = "/rest/v1/telemetry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    LinkDown,
    Throttled,
    /// No endpoint configured; treated as a successful send.
    Unconfigured,
    Sent,
    Failed {
        /// HTTP status if the request reached the server.
        status: Option<u16>,
        failures: u8,
    },
}

impl TickOutcome {
    /// Whether this tick consumed an admission slot.
    pub fn transmitted(&self) -> bool {
        matches!(self, Self::Unconfigured | Self::Sent | Self::Failed { .. })
    }
}

pub struct TelemetryController {
    endpoint: Option<TelemetryEndpoint>,
    min_interval_ms: u64,
    max_retries: u8,
    last_send_ms: Option<u64>,
    failures: u8,
}

impl TelemetryController {
    pub fn new(cfg: &SystemConfig, endpoint: Option<TelemetryEndpoint>) -> Self {
        Self {
            endpoint,
            min_interval_ms: u64::from(cfg.network_min_interval_ms),
            max_retries: cfg.network_max_retries,
            last_send_ms: None,
            failures: 0,
        }
    }

    pub fn failures(&self) -> u8 {
        self.failures
    }

    pub fn last_send_ms(&self) -> Option<u64> {
        self.last_send_ms
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    fn admitted(&self, now_ms: u64) -> bool {
        match self.last_send_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        }
    }

    /// One controller cycle.
    pub fn tick(
        &mut self,
        now_ms: u64,
        store: &StateStore,
        transport: &mut impl TelemetryTransport,
    ) -> TickOutcome {
        if !transport.link_up() {
            return TickOutcome::LinkDown;
        }
        if !self.admitted(now_ms) {
            return TickOutcome::Throttled;
        }

        let Some(endpoint) = self.endpoint.clone() else {
            info!("[Network] telemetry not configured, skipping send");
            self.last_send_ms = Some(now_ms);
            self.failures = 0;
            return TickOutcome::Unconfigured;
        };

        let snap = store.snapshot();
        let result = telemetry_payload(&snap).and_then(|body| {
            let url = format!("{}{}", endpoint.base_url, TELEMETRY_PATH);
            transport.post(&url, endpoint.api_key, &body)
        });
        self.last_send_ms = Some(now_ms);

        match result {
            Ok(200) => {
                info!("[Network] telemetry 200");
                self.failures = 0;
                TickOutcome::Sent
            }
            Ok(code) => {
                warn!("[Network] telemetry HTTP {code}");
                self.fail(Some(code))
            }
            Err(e) => {
                warn!("[Network] telemetry {e}");
                self.fail(None)
            }
        }
    }

    fn fail(&mut self, status: Option<u16>) -> TickOutcome {
        if self.failures >= self.max_retries {
            warn!("[Network] retry counter saturated at {}", self.max_retries);
        } else {
            self.failures += 1;
        }
        TickOutcome::Failed {
            status,
            failures: self.failures,
        }
    }
}
