//! Device context
//!
//! Bundles the capabilities every subsystem needs, so they are passed
//! explicitly instead of living in globals. Constructed once at boot and
//! handed out by `&mut`.

use shutter_hal::{ByteStorage, StorageError, TimeOfDay, WallClock, Watchdog};

use crate::config::{EventCode, ShutterConfig};
use crate::journal::{EventLog, LogEntry, LogError, MountOutcome};
use crate::settings::SettingsStore;
use crate::traits::EventSink;

/// Capabilities plus the journal cursor
pub struct Device<S, C, W, E> {
    pub storage: S,
    pub clock: C,
    pub watchdog: W,
    pub sink: E,
    pub config: ShutterConfig,
    journal: EventLog,
}

impl<S, C, W, E> Device<S, C, W, E>
where
    S: ByteStorage,
    C: WallClock,
    W: Watchdog,
    E: EventSink,
{
    /// Mount the journal and take ownership of the capabilities
    pub async fn mount(
        mut storage: S,
        clock: C,
        watchdog: W,
        sink: E,
        config: ShutterConfig,
    ) -> Result<(Self, MountOutcome), StorageError> {
        let (journal, outcome) = EventLog::mount(&mut storage, config.layout.log).await?;
        Ok((
            Self {
                storage,
                clock,
                watchdog,
                sink,
                config,
                journal,
            },
            outcome,
        ))
    }

    /// Journal an event stamped with the current time of day
    ///
    /// Never fails: the event always reaches the sink, and a storage error
    /// is reported there as [`EventCode::STORAGE_FAULT`].
    pub async fn record(&mut self, code: EventCode) {
        let time = self
            .clock
            .now()
            .map(TimeOfDay::of)
            .unwrap_or(TimeOfDay::MIDNIGHT);
        self.sink.emit(code);
        match self.journal.append(&mut self.storage, code, time).await {
            Ok(()) | Err(LogError::ReservedCode) => {}
            Err(LogError::Storage(_)) => self.sink.emit(EventCode::STORAGE_FAULT),
        }
    }

    /// The `k`-th most recent journal entry
    pub async fn history(&mut self, k: usize) -> LogEntry {
        self.journal.get(&mut self.storage, k).await
    }

    pub fn journal(&self) -> &EventLog {
        &self.journal
    }

    /// Settings store over the configured layout
    pub fn settings(&self) -> SettingsStore {
        SettingsStore::new(self.config.layout)
    }
}
