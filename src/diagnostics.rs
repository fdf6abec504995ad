//! Diagnostic record queue.
//!
//! Scheduler lines, per-task HIT/MISS lines and mode transitions are
//! mirrored to the log as they happen and queued for the Log task, which
//! persists them through a [`DiagnosticSink`].
//!
//! ```text
//! ┌──────────────┐  DiagRecord  ┌──────────┐  append  ┌──────────────────┐
//! │ any task     │────────────▶│ Log task │─────────▶│ /spiffs/edf_log  │
//! │ record(..)   │  (bounded)   │ drain()  │          │ (rotating)       │
//! └──────────────┘              └──────────┘          └──────────────────┘
//! ```
//!
//! Producers never block: when the queue is full the record is dropped
//! (it has already reached the log).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::DiagnosticSink;

/// Longest record kept; longer lines are truncated at a char boundary.
pub const RECORD_LEN: usize = 256;

/// Queue depth.  One Log-task window at default periods produces about
/// 42 records (see `drain_window_fits`); the rest absorbs a late drain.
pub const DIAG_DEPTH: usize = 64;

pub type DiagRecord = heapless::String<RECORD_LEN>;

pub struct DiagnosticQueue {
    channel: Channel<CriticalSectionRawMutex, DiagRecord, DIAG_DEPTH>,
}

impl DiagnosticQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Mirror `line` to the log and queue it.  Returns `false` if dropped.
    pub fn record(&self, line: &str) -> bool {
        info!("{line}");
        let rec = truncate(line);
        if self.channel.try_send(rec).is_err() {
            warn!("diagnostics: queue full, record dropped");
            return false;
        }
        true
    }

    /// Move every queued record into `sink`.  Returns how many were moved.
    pub fn drain(&self, sink: &mut impl DiagnosticSink) -> usize {
        let mut n = 0;
        while let Ok(rec) = self.channel.try_receive() {
            if let Err(e) = sink.append(&rec) {
                warn!("diagnostics: sink append failed: {e}");
            }
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue used by the firmware tasks.
pub static DIAGNOSTICS: DiagnosticQueue = DiagnosticQueue::new();

/// Record on the process-wide queue.
pub fn record(line: &str) -> bool {
    DIAGNOSTICS.record(line)
}

fn truncate(line: &str) -> DiagRecord {
    let mut end = line.len().min(RECORD_LEN);
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    let mut rec = DiagRecord::new();
    let _ = rec.push_str(&line[..end]);
    rec
}
