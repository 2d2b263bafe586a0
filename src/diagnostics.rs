// ShakeWatch - Diagnostic Sinks
//
// The detector reports what it does through an injected sink instead of
// calling the logger directly.  Firmware and the replay binary use `LogSink`;
// tests use `MemorySink` to assert on what was reported.

use std::sync::{Arc, Mutex};

use crate::events::Diagnostic;

pub trait DiagnosticSink {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::ThresholdClamped { .. } => log::warn!("{}", diagnostic),
            Diagnostic::SensorUnavailable | Diagnostic::SubscribeRejected { .. } => {
                log::error!("{}", diagnostic)
            }
            Diagnostic::Registered { .. } | Diagnostic::Unregistered => log::info!("{}", diagnostic),
            Diagnostic::AccuracyChanged { .. } | Diagnostic::ShakeDetected { .. } => {
                log::debug!("{}", diagnostic)
            }
        }
    }
}

/// Keeps every diagnostic in memory.  Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_entries() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        sink.record(Diagnostic::Unregistered);
        assert_eq!(handle.entries(), vec![Diagnostic::Unregistered]);

        handle.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn log_sink_accepts_every_variant() {
        LogSink.record(Diagnostic::SensorUnavailable);
        LogSink.record(Diagnostic::ShakeDetected { timestamp: 1, speed: 2.0 });
    }
}
