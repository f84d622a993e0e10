//! Journal event codes
//!
//! Codes are grouped by subsystem in blocks of 16: board (0x00), settings
//! and clock (0x10), scheduler (0x20), motor (0x30). Code 255 is reserved
//! for the log's end sentinel and for "no valid entry".

use super::types::{Action, RunPhase, RunReason};

/// Event code stored in a journal frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventCode(pub u8);

impl EventCode {
    pub const BOARD_INIT: Self = Self(0);

    pub const SETTINGS_LOAD_ERR: Self = Self(16);
    pub const SETTINGS_SAVE: Self = Self(17);
    pub const RTC_SAVE: Self = Self(18);
    pub const STORAGE_FAULT: Self = Self(19);

    pub const SCHEDULER_INIT: Self = Self(32);
    pub const SCHEDULER_RST: Self = Self(33);
    pub const SCHEDULER_ERR: Self = Self(34);
    pub const SCHEDULER_ACT: Self = Self(35);

    /// End sentinel / invalid entry
    pub const INVALID: Self = Self(255);

    /// Codes with a fixed meaning, independent of configuration
    pub const SYSTEM: [Self; 10] = [
        Self::BOARD_INIT,
        Self::SETTINGS_LOAD_ERR,
        Self::SETTINGS_SAVE,
        Self::RTC_SAVE,
        Self::STORAGE_FAULT,
        Self::SCHEDULER_INIT,
        Self::SCHEDULER_RST,
        Self::SCHEDULER_ERR,
        Self::SCHEDULER_ACT,
        Self::INVALID,
    ];

    /// Description of a system code
    pub const fn describe(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "Board initialized",
            16 => "Settings load error",
            17 => "Settings saved",
            18 => "Clock set",
            19 => "Storage fault",
            32 => "Scheduler initialized",
            33 => "Scheduler restarted",
            34 => "Scheduler error",
            35 => "Scheduled action",
            255 => "Invalid entry",
            _ => return None,
        })
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }
}

/// Start/stop code pair of one (action, reason) combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseCodes {
    pub start: EventCode,
    pub stop: EventCode,
}

impl PhaseCodes {
    pub const fn new(start: u8, stop: u8) -> Self {
        Self {
            start: EventCode(start),
            stop: EventCode(stop),
        }
    }
}

/// Codes journaled on motor start/stop, by action then reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorEventCodes {
    pub table: [[PhaseCodes; 3]; 2],
}

const DESCRIPTIONS: [[[&str; 2]; 3]; 2] = [
    [
        ["Opening started", "Opening stopped"],
        ["Manual opening started", "Manual opening stopped"],
        ["Open measurement started", "Open measurement stopped"],
    ],
    [
        ["Closing started", "Closing stopped"],
        ["Manual closing started", "Manual closing stopped"],
        ["Close measurement started", "Close measurement stopped"],
    ],
];

impl MotorEventCodes {
    /// Code for one phase of a run
    pub const fn code(&self, action: Action, reason: RunReason, phase: RunPhase) -> EventCode {
        let pair = self.table[action.index()][reason.index()];
        match phase {
            RunPhase::Start => pair.start,
            RunPhase::Stop => pair.stop,
        }
    }

    pub const fn start(&self, action: Action, reason: RunReason) -> EventCode {
        self.code(action, reason, RunPhase::Start)
    }

    pub const fn stop(&self, action: Action, reason: RunReason) -> EventCode {
        self.code(action, reason, RunPhase::Stop)
    }

    /// Every configured code, in table order
    pub fn iter(&self) -> impl Iterator<Item = EventCode> + '_ {
        self.table
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|pair| [pair.start, pair.stop])
    }

    /// Look up which run a code belongs to
    pub fn classify(&self, code: EventCode) -> Option<(Action, RunReason, RunPhase)> {
        for action in Action::ALL {
            for reason in RunReason::ALL {
                for phase in [RunPhase::Start, RunPhase::Stop] {
                    if self.code(action, reason, phase) == code {
                        return Some((action, reason, phase));
                    }
                }
            }
        }
        None
    }

    /// Description of a motor code
    pub fn describe(&self, code: EventCode) -> Option<&'static str> {
        self.classify(code).map(|(action, reason, phase)| {
            let p = match phase {
                RunPhase::Start => 0,
                RunPhase::Stop => 1,
            };
            DESCRIPTIONS[action.index()][reason.index()][p]
        })
    }

    /// First code that appears twice or collides with a system code
    pub fn first_conflict(&self) -> Option<EventCode> {
        let mut seen = [false; 256];
        for code in EventCode::SYSTEM {
            seen[code.0 as usize] = true;
        }
        for code in self.iter() {
            if seen[code.0 as usize] {
                return Some(code);
            }
            seen[code.0 as usize] = true;
        }
        None
    }
}

impl Default for MotorEventCodes {
    fn default() -> Self {
        Self {
            table: [
                [
                    PhaseCodes::new(48, 49),
                    PhaseCodes::new(52, 53),
                    PhaseCodes::new(56, 57),
                ],
                [
                    PhaseCodes::new(50, 51),
                    PhaseCodes::new(54, 55),
                    PhaseCodes::new(58, 59),
                ],
            ],
        }
    }
}
