//! Core-pinned thread spawning and FreeRTOS priority hints.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size.  On non-ESP targets, falls back to plain thread spawn.
//!
//! `esp_pthread_set_cfg()` sets thread-local configuration that applies
//! to the *next* `pthread_create()` from the calling thread, so the
//! config→spawn pair must not be interleaved with other thread creation.

use crate::error::{Error, Result};
use crate::scheduler::PriorityHint;
use crate::scheduler::registry::TaskHandle;

/// CPU cores of the dual-core ESP32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: WiFi, lwIP, HTTP server, network-facing tasks.
    Pro = 0,
    /// APP_CPU: sensing and the irrigation decision loop.
    App = 1,
}

/// `configMAX_PRIORITIES` of the stock ESP-IDF FreeRTOS build.
pub const FREERTOS_MAX_PRIORITIES: u8 = 25;

/// Spawn a thread pinned to `core` with explicit priority and stack.
///
/// `name` must be null-terminated (e.g. `"soil\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>> {
    // SAFETY: the config struct lives across the call; `name` is 'static
    // and null-terminated.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed: {ret}");
            return Err(Error::Init("pthread config"));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{display_name}' on {core:?} (pri={priority}, stack={stack_kb}KB)"
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|_| Error::Init("thread spawn"))
}

/// Simulation fallback; ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!("Spawning '{display_name}' (sim, no core pinning, stack={stack_kb}KB)");

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Init("thread spawn"))
}

/// Handle of the calling task, for binding into the task registry.
#[cfg(target_os = "espidf")]
pub fn current_task_handle() -> TaskHandle {
    // SAFETY: returns the running task's TCB pointer; never null in a task.
    TaskHandle(unsafe { esp_idf_sys::xTaskGetCurrentTaskHandle() } as usize)
}

/// Synthetic per-thread handle, starting at 1.
#[cfg(not(target_os = "espidf"))]
pub fn current_task_handle() -> TaskHandle {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(1);
    thread_local! {
        static ID: usize = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TaskHandle(ID.with(|id| *id))
}

/// Pushes scheduler priorities into FreeRTOS.
#[derive(Debug, Default)]
pub struct FreeRtosPriority;

impl PriorityHint for FreeRtosPriority {
    #[cfg(target_os = "espidf")]
    fn set_priority(&mut self, handle: TaskHandle, priority: u8) {
        // SAFETY: handles come from current_task_handle() of tasks that
        // never exit.
        unsafe {
            esp_idf_sys::vTaskPrioritySet(handle.0 as esp_idf_sys::TaskHandle_t, u32::from(priority));
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_priority(&mut self, handle: TaskHandle, priority: u8) {
        log::debug!("priority(sim): task {} -> {priority}", handle.0);
    }

    fn max_priority(&self) -> u8 {
        FREERTOS_MAX_PRIORITIES - 1
    }
}
