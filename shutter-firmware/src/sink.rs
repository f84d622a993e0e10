//! Debug console event sink

use defmt::*;
use shutter_core::config::{EventCode, ShutterConfig};
use shutter_core::traits::EventSink;

/// Prints every journaled event over RTT
pub struct DefmtSink {
    config: ShutterConfig,
}

impl DefmtSink {
    pub fn new(config: ShutterConfig) -> Self {
        Self { config }
    }
}

impl EventSink for DefmtSink {
    fn emit(&mut self, code: EventCode) {
        if code == EventCode::STORAGE_FAULT || code == EventCode::SCHEDULER_ERR {
            warn!("[{}] {}", code.0, self.config.describe(code));
        } else {
            info!("[{}] {}", code.0, self.config.describe(code));
        }
    }
}
