//! Fixed task registry.
//!
//! Populated once at startup, before the registry is shared.  After that,
//! descriptors are only touched through atomics: each task stamps its own
//! `last_activation_ms` and binds its own handle; the scheduler only reads.
//!
//! Stamps are `u32` milliseconds (the target lacks 64-bit atomics) and all
//! deadline arithmetic wraps.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Upper bound on registered tasks.
pub const MAX_TASKS: usize = 8;

/// Index into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u8);

/// Opaque handle to the underlying schedulable unit (a FreeRTOS task
/// handle on the device).  Zero is reserved for "not bound yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryFull;

impl fmt::Display for RegistryFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task registry full ({MAX_TASKS} entries)")
    }
}

#[derive(Debug)]
pub struct TaskDescriptor {
    pub name: &'static str,
    /// Relative deadline, equal to the activation period (ms).
    pub period_ms: u32,
    handle: AtomicUsize,
    last_activation_ms: AtomicU32,
    misses: AtomicU32,
}

impl TaskDescriptor {
    pub fn handle(&self) -> Option<TaskHandle> {
        match self.handle.load(Ordering::Acquire) {
            0 => None,
            h => Some(TaskHandle(h)),
        }
    }

    pub fn last_activation_ms(&self) -> u32 {
        self.last_activation_ms.load(Ordering::Acquire)
    }

    /// `last_activation + period`, wrapping.
    pub fn absolute_deadline_ms(&self) -> u32 {
        self.last_activation_ms().wrapping_add(self.period_ms)
    }

    /// Signed time left until the absolute deadline.
    pub fn remaining_ms(&self, now_ms: u32) -> i32 {
        self.absolute_deadline_ms().wrapping_sub(now_ms) as i32
    }

    pub fn misses(&self) -> u32 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: heapless::Vec<TaskDescriptor, MAX_TASKS>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task.  `now_ms` seeds its activation stamp.
    pub fn register(
        &mut self,
        name: &'static str,
        period_ms: u32,
        now_ms: u32,
    ) -> Result<TaskId, RegistryFull> {
        let id = TaskId(self.tasks.len() as u8);
        self.tasks
            .push(TaskDescriptor {
                name,
                period_ms,
                handle: AtomicUsize::new(0),
                last_activation_ms: AtomicU32::new(now_ms),
                misses: AtomicU32::new(0),
            })
            .map_err(|_| RegistryFull)?;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.tasks.get(id.0 as usize)
    }

    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .map(|i| TaskId(i as u8))
    }

    /// Registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &TaskDescriptor)> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (TaskId(i as u8), t))
    }

    /// Attach the schedulable unit backing `id`.
    pub fn bind(&self, id: TaskId, handle: TaskHandle) {
        if let Some(t) = self.get(id) {
            t.handle.store(handle.0, Ordering::Release);
        }
    }

    /// Stamp the start of an activation.
    pub fn report_start(&self, id: TaskId, now_ms: u32) {
        if let Some(t) = self.get(id) {
            t.last_activation_ms.store(now_ms, Ordering::Release);
        }
    }

    pub fn record_miss(&self, id: TaskId) {
        if let Some(t) = self.get(id) {
            t.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
