//! Progress reporting for one transfer.

use std::sync::{Arc, Mutex};

use tracing::debug;

use clipship_models::UploadEvent;

/// Sink receiving a transfer's events.
pub type EventSink = Box<dyn Fn(UploadEvent) + Send + Sync>;

/// Feeds transcript lines and a monotonic percentage to an event sink.
///
/// Clones share state, so uploader workers and the orchestrator all
/// drive the same bar. Within an attempt the rendered value never
/// decreases; stale or out-of-order updates render nothing. Events are
/// emitted under the internal lock, so the sink must not call back
/// into the reporter.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<Inner>,
}

struct Inner {
    percent: Mutex<f64>,
    sink: EventSink,
}

impl ProgressReporter {
    /// Create a reporter feeding the given sink.
    pub fn new(sink: EventSink) -> Self {
        Self {
            inner: Arc::new(Inner {
                percent: Mutex::new(0.0),
                sink,
            }),
        }
    }

    /// Reporter that drops every event.
    pub fn disabled() -> Self {
        Self::new(Box::new(|_| {}))
    }

    /// Last rendered percentage.
    pub fn percent(&self) -> f64 {
        *self.inner.percent.lock().unwrap()
    }

    /// Rearm to zero at the start of an attempt. Emits nothing.
    pub fn reset(&self) {
        *self.inner.percent.lock().unwrap() = 0.0;
    }

    /// Raise the percentage, clamped to 100. Values at or below the
    /// current one, and values that are not finite, are dropped.
    pub fn update_percent(&self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let clamped = value.min(100.0);
        let mut percent = self.inner.percent.lock().unwrap();
        if clamped <= *percent {
            return;
        }
        *percent = clamped;
        (self.inner.sink)(UploadEvent::progress(clamped));
    }

    /// Snap the bar to 100. Emits only if it is not already there.
    pub fn force_complete(&self) {
        let mut percent = self.inner.percent.lock().unwrap();
        if *percent < 100.0 {
            *percent = 100.0;
            (self.inner.sink)(UploadEvent::progress(100.0));
        }
    }

    /// Append a transcript line.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        (self.inner.sink)(UploadEvent::log(message));
    }

    /// Append a terminal error line.
    pub fn error(&self, message: impl Into<String>) {
        (self.inner.sink)(UploadEvent::error(message.into()));
    }

    /// Emit the done event carrying the stream location.
    pub fn done(&self, stream: impl Into<String>) {
        (self.inner.sink)(UploadEvent::done(stream.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_reporter() -> (ProgressReporter, Arc<Mutex<Vec<UploadEvent>>>) {
        let events: Arc<Mutex<Vec<UploadEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let reporter = ProgressReporter::new(Box::new(move |event| {
            captured.lock().unwrap().push(event);
        }));
        (reporter, events)
    }

    fn progress_values(events: &[UploadEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|event| match event {
                UploadEvent::Progress { value } => Some(*value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_percent_never_decreases() {
        let (reporter, events) = recording_reporter();
        reporter.update_percent(40.0);
        reporter.update_percent(20.0);
        reporter.update_percent(60.0);

        assert_eq!(reporter.percent(), 60.0);
        assert_eq!(progress_values(&events.lock().unwrap()), vec![40.0, 60.0]);
    }

    #[test]
    fn test_percent_clamps_at_100() {
        let (reporter, events) = recording_reporter();
        reporter.update_percent(140.0);

        assert_eq!(reporter.percent(), 100.0);
        assert_eq!(progress_values(&events.lock().unwrap()), vec![100.0]);
    }

    #[test]
    fn test_force_complete_emits_once() {
        let (reporter, events) = recording_reporter();
        reporter.force_complete();
        reporter.force_complete();

        assert_eq!(progress_values(&events.lock().unwrap()), vec![100.0]);
    }

    #[test]
    fn test_reset_rearms_without_emitting() {
        let (reporter, events) = recording_reporter();
        reporter.update_percent(80.0);
        reporter.reset();
        assert_eq!(reporter.percent(), 0.0);

        reporter.update_percent(10.0);
        assert_eq!(progress_values(&events.lock().unwrap()), vec![80.0, 10.0]);
    }

    #[test]
    fn test_non_finite_updates_are_dropped() {
        let (reporter, events) = recording_reporter();
        reporter.update_percent(f64::NAN);
        reporter.update_percent(f64::INFINITY);

        assert!(progress_values(&events.lock().unwrap()).is_empty());
        assert_eq!(reporter.percent(), 0.0);
    }

    #[test]
    fn test_transcript_lines_flow_through() {
        let (reporter, events) = recording_reporter();
        reporter.log("Uploading 5 parts");
        reporter.done("/stream/abc");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(
            matches!(&events[0], UploadEvent::Log { message, .. } if message == "Uploading 5 parts")
        );
        assert!(matches!(&events[1], UploadEvent::Done { stream } if stream == "/stream/abc"));
    }
}
