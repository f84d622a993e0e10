//! Event sink trait

use crate::config::EventCode;

/// Receives every journaled event as it happens
///
/// The firmware prints to the debug console; tests record.
pub trait EventSink {
    fn emit(&mut self, code: EventCode);
}

