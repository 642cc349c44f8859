//! Structured progress events emitted by the compute layer.
//!
//! Format and destination are outside core scope; consumers install a sink.

use serde::{Deserialize, Serialize};

/// One batch of progress from a worker: a board advanced by one slice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub board: u32,
    pub worker: usize,
    /// Pixels that reached a terminal state during this batch.
    pub pixels_resolved: u32,
    /// Delta iterations computed during this batch, summed over pixels.
    pub iterations_computed: u64,
    pub elapsed_ms: f64,
}

/// Observer for progress events. Implementations must tolerate concurrent
/// calls from multiple workers.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards everything. Useful default for tests and batch runs.
#[derive(Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Accumulates events in memory for inspection.
#[derive(Default)]
pub struct CollectingSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

impl ProgressSink for CollectingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().expect("sink poisoned").push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_field_names() {
        let ev = ProgressEvent {
            board: 3,
            worker: 1,
            pixels_resolved: 128,
            iterations_computed: 4096,
            elapsed_ms: 2.5,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"board\":3"));
        assert!(json.contains("\"iterations_computed\":4096"));
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pixels_resolved, 128);
    }

    #[test]
    fn collecting_sink_records_in_order() {
        let sink = CollectingSink::new();
        for i in 0..3 {
            sink.on_progress(&ProgressEvent {
                board: i,
                worker: 0,
                pixels_resolved: 0,
                iterations_computed: 0,
                elapsed_ms: 0.0,
            });
        }
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].board, 2);
    }
}
