//! Motor ownership lock

use portable_atomic::{AtomicU8, Ordering};

/// Whether a run currently owns the motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    Idle,
    Active,
}

impl MotorState {
    const fn as_u8(self) -> u8 {
        match self {
            MotorState::Idle => 0,
            MotorState::Active => 1,
        }
    }
}

/// Two-state lock in a single atomic
///
/// Acquisition is one compare-and-set from `Idle` to `Active`; a second
/// acquirer fails immediately instead of waiting.
pub struct MotorLock {
    state: AtomicU8,
}

impl MotorLock {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(MotorState::Idle.as_u8()),
        }
    }

    /// Take the lock, `false` if already held
    pub fn try_acquire(&self) -> bool {
        self.state
            .compare_exchange(
                MotorState::Idle.as_u8(),
                MotorState::Active.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn release(&self) {
        self.state
            .store(MotorState::Idle.as_u8(), Ordering::Release);
    }

    pub fn state(&self) -> MotorState {
        if self.state.load(Ordering::Acquire) == MotorState::Active.as_u8() {
            MotorState::Active
        } else {
            MotorState::Idle
        }
    }
}

impl Default for MotorLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails() {
        let lock = MotorLock::new();
        assert!(lock.try_acquire());
        assert_eq!(lock.state(), MotorState::Active);
        assert!(!lock.try_acquire());
        lock.release();
        assert_eq!(lock.state(), MotorState::Idle);
        assert!(lock.try_acquire());
    }
}
