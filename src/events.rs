//! Event logging sinks
//!
//! The engine reports user-visible milestones (layer changes, pull-outs,
//! selections) through [`EventSink`]. Logging is fire-and-forget: a sink
//! must never block the engine or fail it.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoriaError, Result};

/// A layer transition started; detail is the 1-based layer being entered
pub const CHANGING_LAYER: &str = "ChangingLayer";

/// An item was pulled out of its slot; detail is the item label
pub const PULL_OUT: &str = "PitchZoomIn";

/// A pulled-out item went back to its slot; detail is the item label
pub const ZOOM_OUT: &str = "ZoomOut";

/// An item's selection was toggled; detail is "<label>:<selected>"
pub const ACCEPT: &str = "Accept";

/// Receiver of engine events
pub trait EventSink {
    fn log_event(&mut self, category: &str, detail: &str);
}

impl<S: EventSink + ?Sized> EventSink for Rc<RefCell<S>> {
    fn log_event(&mut self, category: &str, detail: &str) {
        self.borrow_mut().log_event(category, detail);
    }
}

/// Every sink in the list receives every event
impl EventSink for Vec<Box<dyn EventSink>> {
    fn log_event(&mut self, category: &str, detail: &str) {
        for sink in self.iter_mut() {
            sink.log_event(category, detail);
        }
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn log_event(&mut self, _category: &str, _detail: &str) {}
}

/// One logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub detail: String,
}

/// In-memory event log
#[derive(Debug, Default, Clone)]
pub struct MemoryEventLog {
    records: Vec<EventRecord>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of events logged under `category`
    pub fn count(&self, category: &str) -> usize {
        self.records.iter().filter(|r| r.category == category).count()
    }

    /// Details of every event logged under `category`, oldest first
    pub fn details(&self, category: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.detail.as_str())
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl EventSink for MemoryEventLog {
    fn log_event(&mut self, category: &str, detail: &str) {
        self.records.push(EventRecord {
            timestamp: Utc::now(),
            category: category.to_string(),
            detail: detail.to_string(),
        });
    }
}

/// Event log appended to a CSV file
///
/// Each line is `timestamp,category,detail`. Write failures are reported
/// through `log` and otherwise ignored.
#[derive(Debug)]
pub struct CsvEventLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvEventLog {
    /// Create (or truncate) the CSV file and write the header row
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(MemoriaError::Io)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "timestamp,category,detail")?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, category: &str, detail: &str) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{}",
            Utc::now().to_rfc3339(),
            csv_field(category),
            csv_field(detail)
        )?;
        self.writer.flush()
    }
}

impl EventSink for CsvEventLog {
    fn log_event(&mut self, category: &str, detail: &str) {
        if let Err(e) = self.write_line(category, detail) {
            log::warn!("Dropping event {} for {}: {}", category, self.path.display(), e);
        }
    }
}

/// Quote a CSV field when it contains a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
