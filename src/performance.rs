//! Operation timing.
//!
//! Each wrapped operation produces a `tracing` event and, when a sidecar
//! path is configured, one CSV line `Timestamp,Operation,Duration_ms`.
//! The sidecar is best effort: write failures are logged and never
//! change the wrapped result.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;

pub const CSV_HEADER: &str = "Timestamp,Operation,Duration_ms";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

// ═══════════════════════════════════════════════════════════
// Recorder
// ═══════════════════════════════════════════════════════════

pub struct PerformanceRecorder {
    sidecar: Option<PathBuf>,
    /// Serialises header check and append across threads.
    write_lock: Mutex<()>,
}

impl PerformanceRecorder {
    pub fn new(sidecar: Option<PathBuf>) -> Self {
        Self {
            sidecar,
            write_lock: Mutex::new(()),
        }
    }

    /// Recorder that only emits tracing events.
    pub fn log_only() -> Self {
        Self::new(None)
    }

    pub fn sidecar_path(&self) -> Option<&Path> {
        self.sidecar.as_deref()
    }

    /// Time `f`, log it, append it to the sidecar and hand back its result untouched.
    pub fn record<T, E, F>(&self, operation: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start = Instant::now();
        let result = f();
        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = if result.is_ok() { "ok" } else { "error" };

        tracing::info!(operation, duration_ms, outcome, "Operation completed");
        self.append(operation, duration_ms);
        result
    }

    fn append(&self, operation: &str, duration_ms: u64) {
        let Some(path) = &self.sidecar else {
            return;
        };
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = append_line(path, operation, duration_ms) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write performance log");
        }
    }
}

fn append_line(path: &Path, operation: &str, duration_ms: u64) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        writeln!(file, "{CSV_HEADER}")?;
    }
    let timestamp = chrono::Local::now().naive_local().format(TIMESTAMP_FORMAT);
    // Commas would shift the columns for readers
    let operation = operation.replace(',', ";");
    writeln!(file, "{timestamp},{operation},{duration_ms}")
}

// ═══════════════════════════════════════════════════════════
// Report
// ═══════════════════════════════════════════════════════════

/// Rough speed band used when displaying entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedClass {
    /// Under 100 ms.
    Fast,
    /// 100 to 499 ms.
    Medium,
    Slow,
}

impl SpeedClass {
    pub fn of(duration_ms: u64) -> Self {
        match duration_ms {
            0..=99 => SpeedClass::Fast,
            100..=499 => SpeedClass::Medium,
            _ => SpeedClass::Slow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceEntry {
    pub timestamp: String,
    pub operation: String,
    pub duration_ms: u64,
}

impl PerformanceEntry {
    pub fn speed(&self) -> SpeedClass {
        SpeedClass::of(self.duration_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Newest first.
    pub entries: Vec<PerformanceEntry>,
    pub total: usize,
    pub average_ms: Option<f64>,
    pub fastest: Option<PerformanceEntry>,
    pub slowest: Option<PerformanceEntry>,
}

/// Parse a sidecar file. A missing file is an empty report.
///
/// The first line is taken as the header. Lines with fewer than three
/// columns or a non-numeric duration are skipped.
pub fn load_report(path: &Path) -> std::io::Result<PerformanceReport> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PerformanceReport::default())
        }
        Err(e) => return Err(e),
    };
    Ok(parse_report(&raw))
}

fn parse_report(raw: &str) -> PerformanceReport {
    let mut entries: Vec<PerformanceEntry> = raw
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split(',');
            let timestamp = parts.next()?.trim();
            let operation = parts.next()?.trim();
            let duration_ms = parts.next()?.trim().parse().ok()?;
            Some(PerformanceEntry {
                timestamp: timestamp.to_string(),
                operation: operation.to_string(),
                duration_ms,
            })
        })
        .collect();
    entries.reverse();

    let total = entries.len();
    let average_ms = (total > 0)
        .then(|| entries.iter().map(|e| e.duration_ms as f64).sum::<f64>() / total as f64);
    let fastest = entries.iter().min_by_key(|e| e.duration_ms).cloned();
    let slowest = entries.iter().max_by_key(|e| e.duration_ms).cloned();

    PerformanceReport {
        entries,
        total,
        average_ms,
        fastest,
        slowest,
    }
}
