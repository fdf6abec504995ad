//! AgroNode Firmware — Main Entry Point
//!
//! Hexagonal architecture with one FreeRTOS task per periodic activity and
//! a deadline scheduler re-prioritising them.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayBank      AdcSoilProbe   Dht11        LcdDisplay         │
//! │  (OutputPort)   (SoilProbe)    (Ambient)    (DisplayPort)      │
//! │  EspHttpTransport  ForecastClient  RotatingFileLog  WebServer  │
//! │  (Telemetry)       (ForecastPort)  (DiagnosticSink) (inbound)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  StateStore · IrrigationEngine · FaultMonitor          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EdfScheduler (priority hints) · TaskRegistry                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use agronode::adapters::display::LcdDisplay;
use agronode::adapters::forecast::ForecastClient;
use agronode::adapters::hardware::{AdcSoilProbe, FeedbackHealth, RelayBank};
use agronode::adapters::http_transport::EspHttpTransport;
use agronode::adapters::log_file::{RotatingFileLog, DEFAULT_LOG_PATH};
use agronode::adapters::nvs::NvsConfigStore;
use agronode::adapters::time::{MonotonicClock, TaskDelay};
use agronode::adapters::wifi::{self, WifiCredentials};
use agronode::adapters::web_server;
use agronode::app::ports::{Clock, ConfigPort};
use agronode::app::runtime::{self, TaskIds};
use agronode::app::service::{AppService, HealthService};
use agronode::config::{self, SystemConfig, TelemetryEndpoint};
use agronode::diagnostics::DIAGNOSTICS;
use agronode::drivers::dht11::Dht11;
use agronode::drivers::hw_init::{self, GpioOutput};
use agronode::drivers::lcd::LCD_I2C_ADDR;
use agronode::drivers::task_pin::{self, Core, FreeRtosPriority};
use agronode::irrigation::IrrigationEngine;
use agronode::network::TelemetryController;
use agronode::pins;
use agronode::scheduler::{EdfScheduler, TaskId, TaskRegistry};
use agronode::sensors::moisture::SoilSampler;

type App = AppService<RelayBank<GpioOutput>>;

const SPIFFS_BASE: &[u8] = b"/spiffs\0";

// ── Storage ───────────────────────────────────────────────────

fn mount_spiffs() -> Result<()> {
    let conf = esp_idf_svc::sys::esp_vfs_spiffs_conf_t {
        base_path: SPIFFS_BASE.as_ptr().cast(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` and the base path outlive the call; SPIFFS copies both.
    let ret = unsafe { esp_idf_svc::sys::esp_vfs_spiffs_register(&conf) };
    if ret != esp_idf_svc::sys::ESP_OK as i32 {
        anyhow::bail!("SPIFFS mount failed ({ret})");
    }
    info!("SPIFFS mounted at /spiffs");
    Ok(())
}

// ── Task spawning ─────────────────────────────────────────────

struct Shared {
    app: Arc<App>,
    registry: Arc<TaskRegistry>,
    clock: MonotonicClock,
}

impl Shared {
    /// Spawn a periodic task that binds its handle before the first run.
    fn spawn(
        &self,
        id: TaskId,
        core: Core,
        stack_kb: usize,
        name: &'static str,
        mut body: impl FnMut(&App, u64) -> u32 + Send + 'static,
    ) -> Result<()> {
        let app = Arc::clone(&self.app);
        let registry = Arc::clone(&self.registry);
        let clock = self.clock;
        let priority = app.config().min_task_priority;
        task_pin::spawn_on_core(core, priority, stack_kb, name, move || {
            registry.bind(id, task_pin::current_task_handle());
            runtime::run_periodic(&registry, id, &clock, &DIAGNOSTICS, |now| body(&app, now))
        })?;
        Ok(())
    }
}

fn spawn_tasks(
    shared: &Shared,
    ids: TaskIds,
    cfg: &SystemConfig,
    lcd_bus: Option<I2cDriver<'static>>,
) -> Result<()> {
    // ── Sensing and control (APP_CPU) ─────────────────────────
    let engine = IrrigationEngine::new(cfg.clone());
    let period = cfg.decision_period_ms;
    shared.spawn(ids.switch, Core::App, 4, "switch\0", move |app, now| {
        app.switch_cycle(&engine, now);
        period
    })?;

    let mut sampler = SoilSampler::new(AdcSoilProbe, cfg.soil_adc_wet, cfg.soil_adc_dry);
    let period = cfg.deadline_soil_ms;
    shared.spawn(ids.soil, Core::App, 4, "soil\0", move |app, _| {
        app.soil_cycle(&mut sampler, &mut TaskDelay);
        period
    })?;

    let mut dht = Dht11::new(pins::DHT_GPIO);
    shared.spawn(ids.ambient, Core::App, 4, "ambient\0", move |app, now| {
        app.ambient_cycle(&mut dht, now)
    })?;

    let (pump_level, lamp_level) = shared
        .app
        .with_outputs(|o| (o.pump_level(), o.lamp_level()));
    let mut health = HealthService::new(
        cfg,
        FeedbackHealth::board("pump", pins::FEEDBACK_PUMP_GPIO, pump_level),
        FeedbackHealth::board("lamp", pins::FEEDBACK_LAMP_GPIO, lamp_level),
    );
    let period = cfg.deadline_health_ms;
    shared.spawn(ids.health, Core::App, 4, "health\0", move |app, now| {
        app.health_cycle(&mut health, &DIAGNOSTICS, now);
        period
    })?;

    // ── Network-facing (PRO_CPU) ──────────────────────────────
    let mut telemetry = TelemetryController::new(cfg, TelemetryEndpoint::from_build_env());
    let mut transport = EspHttpTransport::new();
    let period = cfg.network_period_ms;
    shared.spawn(ids.network, Core::Pro, 10, "network\0", move |app, now| {
        telemetry.tick(now, app.store(), &mut transport);
        period
    })?;

    let mut forecast = ForecastClient::new(EspHttpTransport::new(), config::forecast_api_key());
    shared.spawn(ids.forecast, Core::Pro, 12, "forecast\0", move |app, _| {
        app.forecast_cycle(&mut forecast)
    })?;

    let period = cfg.deadline_display_ms;
    match lcd_bus {
        Some(bus) => {
            let mut lcd = LcdDisplay::new(bus, TaskDelay, LCD_I2C_ADDR);
            shared.spawn(ids.display, Core::Pro, 4, "display\0", move |app, _| {
                app.display_cycle(&mut lcd);
                period
            })?;
        }
        None => {
            let mut lcd = agronode::adapters::display::LogDisplay;
            shared.spawn(ids.display, Core::Pro, 4, "display\0", move |app, _| {
                app.display_cycle(&mut lcd);
                period
            })?;
        }
    }

    let mut sink = RotatingFileLog::new(DEFAULT_LOG_PATH, cfg.diag_log_max_bytes);
    let period = cfg.deadline_log_ms;
    shared.spawn(ids.log, Core::Pro, 6, "log\0", move |_, _| {
        DIAGNOSTICS.drain(&mut sink);
        period
    })?;

    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AgroNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsConfigStore::new().and_then(|nvs| nvs.load()) {
        Ok(c) => c,
        Err(e) => {
            warn!("NVS unavailable ({e}), running with defaults");
            SystemConfig::default()
        }
    };

    // ── 3. Storage and peripherals ────────────────────────────
    if let Err(e) = mount_spiffs() {
        warn!("{e}; diagnostics log and web UI unavailable");
    }
    if let Err(e) = hw_init::init_peripherals() {
        // Relays cannot be trusted without GPIO setup.
        error!("HAL init failed: {e}, halting");
        return Err(e.into());
    }

    let i2c_conf = I2cConfig::new().baudrate(Hertz(100_000));
    let lcd_bus = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &i2c_conf,
    )
    .inspect_err(|e| warn!("I2C init failed ({e}), LCD disabled"))
    .ok();

    // ── 4. WiFi (non-fatal) ───────────────────────────────────
    let _wifi = match WifiCredentials::from_build_env() {
        Ok(creds) => wifi::connect_station(peripherals.modem, sysloop, nvs_partition, &creds)
            .inspect_err(|e| warn!("WiFi: {e}; running offline"))
            .ok(),
        Err(e) => {
            warn!("WiFi: {e}; running offline");
            None
        }
    };

    // ── 5. Application core ───────────────────────────────────
    let clock = MonotonicClock::new();
    let app: Arc<App> = Arc::new(AppService::new(config.clone(), RelayBank::board()));
    app.apply_outputs();

    let mut registry = TaskRegistry::new();
    let ids = runtime::register_tasks(&mut registry, &config, clock.now_ms() as u32)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let registry = Arc::new(registry);

    let shared = Shared {
        app: Arc::clone(&app),
        registry: Arc::clone(&registry),
        clock,
    };
    spawn_tasks(&shared, ids, &config, lcd_bus)?;

    // ── 6. Deadline scheduler ─────────────────────────────────
    let scheduler = EdfScheduler::new(config.max_task_priority, config.min_task_priority);
    let tick_ms = config.scheduler_tick_ms;
    let sched_prio = config.max_task_priority.saturating_add(1);
    {
        let registry = Arc::clone(&registry);
        task_pin::spawn_on_core(Core::App, sched_prio, 4, "edf\0", move || {
            let mut hint = FreeRtosPriority;
            runtime::run_scheduler(&scheduler, &registry, &clock, &mut hint, &DIAGNOSTICS, tick_ms)
        })?;
    }

    // ── 7. Web UI ─────────────────────────────────────────────
    let _server = web_server::start(Arc::clone(&app), clock)
        .inspect_err(|e| warn!("web server: {e}"))
        .ok();

    info!("System ready.");

    // Keeps WiFi and the HTTP server alive.
    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}
